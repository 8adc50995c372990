use super::Directory;
use crate::error::{DirectoryError, TranslationError};
use crate::models::UserRecord;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::trace;

/// Caches `find_user` results for the duration of a run.
///
/// Entries are keyed by `(search base, lookup key)`, so a record found under
/// one base is never handed out for another. Group and report lookups are
/// passed through untouched.
pub struct CachedDirectory<D> {
    inner: D,
    users: Mutex<HashMap<(String, String), UserRecord>>,
}

impl<D: Directory> CachedDirectory<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            users: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_users(&self) -> usize {
        self.users.lock().len()
    }

    pub fn into_inner(self) -> D {
        self.inner
    }
}

#[async_trait]
impl<D: Directory> Directory for CachedDirectory<D> {
    fn search_base(&self) -> &str {
        self.inner.search_base()
    }

    async fn find_user(&self, key: &str) -> Result<UserRecord, DirectoryError> {
        let cache_key = (self.inner.search_base().to_string(), key.to_string());
        let cached = self.users.lock().get(&cache_key).cloned();
        if let Some(user) = cached {
            trace!("cache hit for {}", key);
            return Ok(user);
        }
        let user = self.inner.find_user(key).await?;
        self.users.lock().insert(cache_key, user.clone());
        Ok(user)
    }

    async fn group_members(&self, group_cn: &str) -> Result<Vec<String>, DirectoryError> {
        self.inner.group_members(group_cn).await
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, DirectoryError> {
        self.inner.search_users(query).await
    }

    async fn group_display_name(&self, group_dn: &str) -> Result<String, TranslationError> {
        self.inner.group_display_name(group_dn).await
    }
}
