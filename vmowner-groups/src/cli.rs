use clap::Parser;
use std::path::PathBuf;

/// Search the directory for users and report every group they belong to.
#[derive(Debug, Parser)]
#[command(name = "vmowner-groups", version)]
pub struct Cli {
    /// Account used for the directory bind, without the domain
    #[arg(short, long)]
    pub username: String,

    /// Users to look up: 'Full Name' in quotes, an account name, or a partial match such as 'jo*'
    #[arg(required = true, num_args = 1..)]
    pub users: Vec<String>,

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
