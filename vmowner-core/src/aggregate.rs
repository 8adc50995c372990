//! Host -> users inversion.
//!
//! The resolver produces, per host, the users to tell. Mail goes out once
//! per recipient covering all of their hosts, so the structure is turned
//! around here: one `Notification` per distinct recipient.

use crate::models::{HostUsers, Notification, NotificationDetails, Recipient};
use std::collections::HashMap;

/// Notifications in first-seen recipient order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    notifications: Vec<Notification>,
    index: HashMap<Recipient, usize>,
}

impl Aggregation {
    pub fn get(&self, recipient: &Recipient) -> Option<&Notification> {
        self.index.get(recipient).map(|&i| &self.notifications[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Total `(recipient, host)` pairs held.
    pub fn pair_count(&self) -> usize {
        self.notifications.iter().map(|n| n.servers.len()).sum()
    }

    fn entry(&mut self, recipient: &Recipient) -> &mut Notification {
        let i = match self.index.get(recipient) {
            Some(&i) => i,
            None => {
                self.notifications.push(Notification::new(recipient.clone()));
                self.index.insert(recipient.clone(), self.notifications.len() - 1);
                self.notifications.len() - 1
            }
        };
        &mut self.notifications[i]
    }
}

impl<'a> IntoIterator for &'a Aggregation {
    type Item = &'a Notification;
    type IntoIter = std::slice::Iter<'a, Notification>;

    fn into_iter(self) -> Self::IntoIter {
        self.notifications.iter()
    }
}

/// Pass one creates an empty entry for every recipient, pass two files each
/// host under its users and overwrites the details, so the last record seen
/// for a recipient wins. Users without mail share the `NoEmail` entry.
pub fn aggregate(hosts: &[HostUsers]) -> Aggregation {
    let mut agg = Aggregation::default();

    for host in hosts {
        for user in &host.users {
            agg.entry(&user.recipient());
        }
    }

    for host in hosts {
        for user in &host.users {
            let notification = agg.entry(&user.recipient());
            notification.servers.push(host.host.clone());
            notification.details = NotificationDetails {
                given_name: user.given_name.clone(),
                active: user.active,
            };
        }
    }

    agg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRecord;

    fn user(account: &str, email: Option<&str>, active: bool) -> UserRecord {
        UserRecord {
            email: email.map(String::from),
            given_name: Some(account.to_uppercase()),
            account_name: Some(account.into()),
            distinguished_name: format!("CN={account},DC=example"),
            active,
            ..Default::default()
        }
    }

    fn host(id: &str, users: Vec<UserRecord>) -> HostUsers {
        HostUsers { host: id.into(), users }
    }

    #[test]
    fn test_shared_user_gets_one_entry() {
        let alice = user("alice", Some("alice@example.org"), true);
        let bob = user("bob", Some("bob@example.org"), true);
        let agg = aggregate(&[
            host("web01", vec![alice.clone(), bob.clone()]),
            host("web02", vec![bob]),
        ]);

        assert_eq!(agg.len(), 2);
        let bob = agg.get(&Recipient::Address("bob@example.org".into())).unwrap();
        assert_eq!(bob.servers, vec!["web01", "web02"]);
        assert_eq!(bob.details.given_name.as_deref(), Some("BOB"));
        let alice = agg.get(&alice.recipient()).unwrap();
        assert_eq!(alice.servers, vec!["web01"]);
    }

    #[test]
    fn test_pair_count_matches_resolved_lengths() {
        let a = user("a", Some("a@example.org"), true);
        let b = user("b", None, true);
        let c = user("c", None, false);
        let hosts = vec![
            host("h1", vec![a.clone(), b.clone()]),
            host("h2", vec![]),
            host("h3", vec![a.clone(), c, a]),
        ];
        let agg = aggregate(&hosts);
        let expected: usize = hosts.iter().map(|h| h.users.len()).sum();
        assert_eq!(agg.pair_count(), expected);
        assert_eq!(agg.get(&Recipient::Address("a@example.org".into())).unwrap().servers.len(), 3);
    }

    #[test]
    fn test_missing_email_is_one_bucket() {
        let agg = aggregate(&[
            host("web01", vec![user("svc1", None, true)]),
            host("web02", vec![user("svc2", None, true)]),
        ]);
        assert_eq!(agg.len(), 1);
        let bucket = agg.get(&Recipient::NoEmail).unwrap();
        assert_eq!(bucket.servers, vec!["web01", "web02"]);
    }

    #[test]
    fn test_last_seen_details_win() {
        let enabled = user("dana", Some("dana@example.org"), true);
        let mut disabled = enabled.clone();
        disabled.active = false;
        disabled.given_name = Some("Dana".into());

        let agg = aggregate(&[host("h1", vec![enabled]), host("h2", vec![disabled])]);
        let dana = agg.get(&Recipient::Address("dana@example.org".into())).unwrap();
        assert!(!dana.details.active);
        assert_eq!(dana.details.given_name.as_deref(), Some("Dana"));
    }

    #[test]
    fn test_recipient_order_is_first_seen() {
        let agg = aggregate(&[
            host("h1", vec![user("zed", Some("zed@example.org"), true)]),
            host("h2", vec![user("amy", Some("amy@example.org"), true)]),
        ]);
        let order: Vec<String> = agg.iter().map(|n| n.recipient.to_string()).collect();
        assert_eq!(order, vec!["zed@example.org", "amy@example.org"]);
    }

    #[test]
    fn test_empty_input() {
        let agg = aggregate(&[]);
        assert!(agg.is_empty());
        assert_eq!(agg.pair_count(), 0);
    }
}
