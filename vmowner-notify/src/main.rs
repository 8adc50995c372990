//! vmowner-notify - tells VM users about scheduled patching
//!
//! For every host in the inventory the users are resolved (access group,
//! host override or inventory override), grouped per recipient and then
//! either emailed (`--run`) or listed (default dry run).

mod cli;
mod mailer;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use mailer::{PatchNotice, Signature, SmtpRelayNotifier};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vmowner_core::{
    aggregate, dispatch, load_config, load_inventory, resolve_inventory, CachedDirectory,
    Directory, DispatchReport, Inventory, LdapDirectory, RunMode, ToolConfig,
};

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn notify_all<D: Directory>(
    dir: &D,
    cli: &Cli,
    cfg: &ToolConfig,
    inventory: &Inventory,
) -> Result<DispatchReport> {
    let account = cfg.directory.account_name(&cli.username);
    let sender = dir
        .find_user(account)
        .await
        .with_context(|| format!("Failed to look up sending account '{}'", account))?;

    let resolved = resolve_inventory(dir, &cfg.directory.group_naming(), inventory)
        .await
        .context("Failed to resolve host users")?;
    let agg = aggregate(&resolved);
    info!("{} hosts resolved to {} recipients", resolved.len(), agg.len());

    let template = PatchNotice {
        date: cli.date.clone(),
        signature: Signature::from_record(&sender),
    };
    let notifier = SmtpRelayNotifier::new(&cfg.mail, template);

    let report = dispatch(&agg, RunMode::from_run_flag(cli.run), &notifier)
        .await
        .context("Failed to send notifications")?;
    Ok(report)
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

    // Nothing is queried until the inventory is known to be usable.
    let inventory =
        load_inventory(&cli.inventory).context("Something is wrong with the inventory file")?;
    info!("{} hosts in {:?}", inventory.hosts.len(), cli.inventory);

    let password =
        rpassword::prompt_password("Enter your AD password: ").context("Failed to read password")?;
    let ldap = LdapDirectory::connect(&cfg.directory, &cli.username, &password)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.directory.url()))?;

    let (outcome, ldap) = if cfg.directory.cache_lookups {
        let cached = CachedDirectory::new(ldap);
        let outcome = notify_all(&cached, &cli, &cfg, &inventory).await;
        (outcome, cached.into_inner())
    } else {
        let outcome = notify_all(&ldap, &cli, &cfg, &inventory).await;
        (outcome, ldap)
    };
    if let Err(e) = ldap.close().await {
        warn!("unbind failed: {}", e);
    }
    let report = outcome?;

    if !cli.run {
        println!("Dry run, no email sent. Use --run to email these users.");
    }
    for line in report.lines() {
        println!("{line}");
    }
    info!("{}", report.summary());
    Ok(())
}
