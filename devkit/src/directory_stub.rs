/*!
In-memory directory for tests.

Users, groups and group names are registered up front; every call made
through the `Directory` trait is recorded so tests can assert which lookups
happened (or did not).
*/

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use vmowner_core::directory::{is_distinguished_name, Directory};
use vmowner_core::{DirectoryError, TranslationError, UserRecord};

/// A query received by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    FindUser(String),
    GroupMembers(String),
    SearchUsers(String),
    GroupName(String),
}

pub struct MockDirectory {
    search_base: String,
    users: Vec<UserRecord>,
    groups: HashMap<String, Vec<String>>,
    group_names: HashMap<String, String>,
    broken_groups: HashSet<String>,
    queries: Mutex<Vec<Query>>,
}

impl MockDirectory {
    pub fn new() -> Self {
        Self::with_search_base("dc=example,dc=org")
    }

    pub fn with_search_base<S: Into<String>>(search_base: S) -> Self {
        Self {
            search_base: search_base.into(),
            users: Vec::new(),
            groups: HashMap::new(),
            group_names: HashMap::new(),
            broken_groups: HashSet::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user(mut self, user: UserRecord) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_users<I: IntoIterator<Item = UserRecord>>(mut self, users: I) -> Self {
        self.users.extend(users);
        self
    }

    /// Register a group by cn. Members are whatever `find_user` accepts:
    /// account names or DNs.
    pub fn with_group(mut self, cn: &str, members: &[&str]) -> Self {
        self.groups
            .insert(cn.to_string(), members.iter().map(|m| m.to_string()).collect());
        self
    }

    /// Register a group whose members are the DNs of the given users.
    pub fn with_group_of(mut self, cn: &str, members: &[&UserRecord]) -> Self {
        self.groups.insert(
            cn.to_string(),
            members.iter().map(|u| u.distinguished_name.clone()).collect(),
        );
        self
    }

    pub fn with_group_name(mut self, dn: &str, cn: &str) -> Self {
        self.group_names.insert(dn.to_string(), cn.to_string());
        self
    }

    /// Make `group_display_name` fail with a lookup error for `dn`.
    pub fn with_broken_group(mut self, dn: &str) -> Self {
        self.broken_groups.insert(dn.to_string());
        self
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Query) -> bool) -> usize {
        self.queries.lock().iter().filter(|q| pred(q)).count()
    }

    pub fn group_lookups(&self) -> Vec<String> {
        self.queries
            .lock()
            .iter()
            .filter_map(|q| match q {
                Query::GroupMembers(cn) => Some(cn.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.queries.lock().clear();
    }

    fn record(&self, query: Query) {
        self.queries.lock().push(query);
    }
}

impl Default for MockDirectory {
    fn default() -> Self {
        Self::new()
    }
}

/// `jo*` style prefix match, otherwise case-insensitive equality.
fn matches_query(value: Option<&str>, query: &str) -> bool {
    let Some(value) = value else { return false };
    let value = value.to_lowercase();
    let query = query.to_lowercase();
    match query.strip_suffix('*') {
        Some(prefix) => value.starts_with(prefix),
        None => value == query,
    }
}

#[async_trait]
impl Directory for MockDirectory {
    fn search_base(&self) -> &str {
        &self.search_base
    }

    async fn find_user(&self, key: &str) -> Result<UserRecord, DirectoryError> {
        self.record(Query::FindUser(key.to_string()));
        let by_dn = is_distinguished_name(key);
        self.users
            .iter()
            .find(|u| {
                if by_dn {
                    u.distinguished_name.eq_ignore_ascii_case(key)
                } else {
                    u.account_name.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(key))
                }
            })
            .cloned()
            .ok_or_else(|| DirectoryError::UserNotFound(key.to_string()))
    }

    async fn group_members(&self, group_cn: &str) -> Result<Vec<String>, DirectoryError> {
        self.record(Query::GroupMembers(group_cn.to_string()));
        Ok(self.groups.get(group_cn).cloned().unwrap_or_default())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, DirectoryError> {
        self.record(Query::SearchUsers(query.to_string()));
        Ok(self
            .users
            .iter()
            .filter(|u| {
                matches_query(u.display_name.as_deref(), query)
                    || matches_query(u.account_name.as_deref(), query)
            })
            .cloned()
            .collect())
    }

    async fn group_display_name(&self, group_dn: &str) -> Result<String, TranslationError> {
        self.record(Query::GroupName(group_dn.to_string()));
        if self.broken_groups.contains(group_dn) {
            return Err(TranslationError::Lookup {
                dn: group_dn.to_string(),
                reason: "invalidDNSyntax".into(),
            });
        }
        self.group_names
            .get(group_dn)
            .cloned()
            .ok_or_else(|| TranslationError::NotFound(group_dn.to_string()))
    }
}
