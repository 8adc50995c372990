use clap::Parser;
use std::path::PathBuf;

/// Emails the registered users of every VM in an inventory about scheduled
/// patching. Without --run nothing is sent; the tool only prints who would
/// be emailed.
#[derive(Debug, Parser)]
#[command(name = "vmowner-notify", version)]
pub struct Cli {
    /// Path to the YAML inventory file
    #[arg(short, long)]
    pub inventory: PathBuf,

    /// Email everyone instead of doing a dry run
    #[arg(short, long)]
    pub run: bool,

    /// Account used for the directory bind, without the domain
    #[arg(short, long)]
    pub username: String,

    /// Patching date as it should appear in the email, e.g. '21st March 2021'
    #[arg(short, long)]
    pub date: String,

    /// Directory server FQDN (overrides the config file)
    #[arg(short, long)]
    pub server: Option<String>,

    /// Directory search base, e.g. 'OU=Everything,dc=domain,dc=company,dc=com'
    #[arg(short = 'b', long = "searchbase")]
    pub search_base: Option<String>,

    /// Tool configuration file (default: $VMOWNER_CONFIG or ./vmowner.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
