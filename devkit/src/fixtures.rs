//! Ready-made records and files for tests.

use anyhow::Result;
use std::io::Write;
use tempfile::NamedTempFile;
use vmowner_core::UserRecord;

pub const MAIL_DOMAIN: &str = "example.org";

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Active user `account` with mail `account@example.org`.
pub fn user(account: &str) -> UserRecord {
    let given = capitalize(account);
    UserRecord {
        email: Some(format!("{account}@{MAIL_DOMAIN}")),
        display_name: Some(format!("{given} Tester")),
        given_name: Some(given.clone()),
        account_name: Some(account.to_string()),
        title: Some("Researcher".into()),
        distinguished_name: format!("CN={given} Tester,OU=Staff,DC=example,DC=org"),
        member_of: Vec::new(),
        active: true,
    }
}

/// Same as `user` but with the account disabled (`userAccountControl` 514).
pub fn disabled(account: &str) -> UserRecord {
    UserRecord {
        active: false,
        ..user(account)
    }
}

pub fn without_email(account: &str) -> UserRecord {
    UserRecord {
        email: None,
        ..user(account)
    }
}

pub fn member_of(mut record: UserRecord, groups: &[&str]) -> UserRecord {
    record.member_of = groups.iter().map(|g| g.to_string()).collect();
    record
}

/// Write `yaml` to a temporary inventory file, removed on drop.
pub fn inventory_file(yaml: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile()?;
    file.write_all(yaml.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Route `tracing` output to the test harness; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
