//! Delivery of aggregated notifications.
//!
//! `RunMode` only decides whether the notifier is actually called; which
//! recipients are told, skipped or flagged is the same in both modes.

use crate::aggregate::Aggregation;
use crate::error::NotifyError;
use crate::models::{Notification, Recipient};
use async_trait::async_trait;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    DryRun,
    Live,
}

impl RunMode {
    pub fn from_run_flag(run: bool) -> Self {
        if run {
            RunMode::Live
        } else {
            RunMode::DryRun
        }
    }
}

/// What a notifier is asked to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub email: String,
    pub given_name: Option<String>,
    pub servers: Vec<String>,
}

impl Notice {
    pub fn server_list(&self) -> String {
        self.servers.join(", ")
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Notified,
    WouldNotify,
    SkippedDisabled,
    /// Users resolved for these hosts have no mail on file.
    MissingEmail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchEntry {
    pub notification: Notification,
    pub outcome: Outcome,
}

impl DispatchEntry {
    /// Console lines for this entry: one per recipient, or one per affected
    /// host for users without email.
    pub fn lines(&self) -> Vec<String> {
        let servers = self.notification.server_list();
        let who = &self.notification.recipient;
        match self.outcome {
            Outcome::Notified => vec![format!("Emailing User: {who}, Servers: {servers}")],
            Outcome::WouldNotify => vec![format!("NOT Emailing User: {who}, Servers: {servers}")],
            Outcome::SkippedDisabled => vec![format!("DISABLED USER: {who}, Servers: {servers}")],
            Outcome::MissingEmail => self
                .notification
                .servers
                .iter()
                .map(|host| format!("error in group config: {host}"))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub entries: Vec<DispatchEntry>,
}

impl DispatchReport {
    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    pub fn with_outcome(&self, outcome: Outcome) -> impl Iterator<Item = &DispatchEntry> {
        self.entries.iter().filter(move |e| e.outcome == outcome)
    }

    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().flat_map(DispatchEntry::lines).collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} notified, {} dry-run, {} disabled, {} config errors",
            self.count(Outcome::Notified),
            self.count(Outcome::WouldNotify),
            self.count(Outcome::SkippedDisabled),
            self.count(Outcome::MissingEmail),
        )
    }
}

/// Walk the aggregation in order. A delivery failure stops the run.
pub async fn dispatch<N>(
    agg: &Aggregation,
    mode: RunMode,
    notifier: &N,
) -> Result<DispatchReport, NotifyError>
where
    N: Notifier + ?Sized,
{
    let mut report = DispatchReport::default();

    for notification in agg {
        let outcome = match &notification.recipient {
            Recipient::NoEmail => {
                warn!("users without email on hosts: {}", notification.server_list());
                Outcome::MissingEmail
            }
            Recipient::Address(_) if !notification.details.active => Outcome::SkippedDisabled,
            Recipient::Address(_) if mode == RunMode::DryRun => Outcome::WouldNotify,
            Recipient::Address(email) => {
                let notice = Notice {
                    email: email.clone(),
                    given_name: notification.details.given_name.clone(),
                    servers: notification.servers.clone(),
                };
                notifier.notify(&notice).await?;
                info!("notified {}", email);
                Outcome::Notified
            }
        };
        report.entries.push(DispatchEntry {
            notification: notification.clone(),
            outcome,
        });
    }

    Ok(report)
}
