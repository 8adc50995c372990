/*!
Notifier stub: records notices instead of sending mail.
*/

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use vmowner_core::{Notice, Notifier, NotifyError};

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notice>>,
    failing: HashSet<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to `email` fail as if the relay rejected them.
    pub fn failing_for(mut self, email: &str) -> Self {
        self.failing.insert(email.to_string());
        self
    }

    pub fn sent(&self) -> Vec<Notice> {
        self.sent.lock().clone()
    }

    pub fn sent_to(&self, email: &str) -> Option<Notice> {
        self.sent.lock().iter().find(|n| n.email == email).cloned()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: &Notice) -> Result<(), NotifyError> {
        if self.failing.contains(&notice.email) {
            return Err(NotifyError::Delivery {
                recipient: notice.email.clone(),
                reason: "554 relay access denied".into(),
            });
        }
        tracing::info!("[MOCK] mail to {} for {}", notice.email, notice.server_list());
        self.sent.lock().push(notice.clone());
        Ok(())
    }
}
