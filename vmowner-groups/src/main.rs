//! vmowner-groups - prints the directory groups of one or more users
//!
//! Each query is matched against both cn and sAMAccountName; every matching
//! user is printed with the short names of all of their groups.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;
use vmowner_core::{load_config, report, Directory, LdapDirectory};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn print_reports<D: Directory>(dir: &D, queries: &[String]) -> Result<()> {
    for query in queries {
        let reports = report(dir, query)
            .await
            .with_context(|| format!("Failed to search for '{query}'"))?;
        debug!("{} entries matched '{}'", reports.len(), query);
        if reports.is_empty() {
            println!("No directory entries matched '{query}'");
        }
        for member in &reports {
            print!("{}", member.render());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    let cfg = load_config(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?
        .with_overrides(cli.server.clone(), cli.search_base.clone());

    let password =
        rpassword::prompt_password("Enter your AD password: ").context("Failed to read password")?;
    let ldap = LdapDirectory::connect(&cfg.directory, &cli.username, &password)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.directory.url()))?;

    let outcome = print_reports(&ldap, &cli.users).await;
    if let Err(e) = ldap.close().await {
        warn!("unbind failed: {}", e);
    }
    outcome
}
