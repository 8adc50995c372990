use serde::{Deserialize, Serialize};
use std::fmt;

/// `userAccountControl` value Active Directory reports for a disabled
/// normal account.
pub const DISABLED_ACCOUNT_CONTROL: i64 = 514;

/// One user entry as returned by a directory lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// `None` when the entry has no `mail` attribute.
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub given_name: Option<String>,
    pub account_name: Option<String>,
    pub title: Option<String>,
    pub distinguished_name: String,
    /// Group DNs from `memberOf`, as stored in the directory.
    pub member_of: Vec<String>,
    pub active: bool,
}

impl UserRecord {
    pub fn recipient(&self) -> Recipient {
        match &self.email {
            Some(email) => Recipient::Address(email.clone()),
            None => Recipient::NoEmail,
        }
    }
}

/// Only the exact disabled code counts as inactive; anything else,
/// including a missing value, is active.
pub fn account_active(account_control: Option<i64>) -> bool {
    account_control != Some(DISABLED_ACCOUNT_CONTROL)
}

/// Aggregation key: a mail address, or the bucket for users without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Recipient {
    Address(String),
    NoEmail,
}

impl Recipient {
    pub fn email(&self) -> Option<&str> {
        match self {
            Recipient::Address(email) => Some(email),
            Recipient::NoEmail => None,
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Address(email) => f.write_str(email),
            Recipient::NoEmail => f.write_str("<no email>"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDetails {
    pub given_name: Option<String>,
    pub active: bool,
}

/// Everything one recipient has to be told about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Recipient,
    /// One entry per host that resolved to this recipient, in resolution order.
    pub servers: Vec<String>,
    /// Copied from the last record seen for this recipient.
    pub details: NotificationDetails,
}

impl Notification {
    pub fn new(recipient: Recipient) -> Self {
        Self {
            recipient,
            servers: Vec::new(),
            details: NotificationDetails::default(),
        }
    }

    /// Human readable list of servers, e.g. `web01, web02`.
    pub fn server_list(&self) -> String {
        self.servers.join(", ")
    }
}

/// Resolved users of one inventory host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUsers {
    pub host: String,
    pub users: Vec<UserRecord>,
}
