//! Error types, one enum per concern.
//!
//! Business "empty" results (a host whose group does not exist) are not
//! errors and never show up here.

use std::path::PathBuf;

/// Failures while loading the inventory file. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum InventoryError {
    #[error("cannot read inventory {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed inventory: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("inventory has no top-level 'all' section")]
    MissingAll,
    #[error("unsupported host key in inventory: {0}")]
    InvalidHostKey(String),
    #[error("{scope} sets override but has no machine_users list")]
    MissingMachineUsers { scope: String },
}

/// Directory lookups that the run cannot recover from.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("LDAP error: {0}")]
    Ldap(#[from] ldap3::LdapError),
    #[error("no directory entry for user '{0}'")]
    UserNotFound(String),
}

/// Failure to turn a group DN into its short name. The reporter degrades
/// these to a placeholder instead of aborting.
#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("lookup of group '{dn}' failed: {reason}")]
    Lookup { dn: String, reason: String },
    #[error("group '{0}' does not exist")]
    NotFound(String),
    #[error("group '{0}' has no cn attribute")]
    MissingName(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Raised by a `Notifier`; terminates a live run.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid address '{address}': {reason}")]
    Address { address: String, reason: String },
    #[error("cannot build message for {recipient}: {reason}")]
    Message { recipient: String, reason: String },
    #[error("delivery to {recipient} failed: {reason}")]
    Delivery { recipient: String, reason: String },
}
