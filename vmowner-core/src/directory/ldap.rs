//! LDAP implementation of `Directory` on top of `ldap3`.

use super::{
    account_filter, cn_from_attrs, group_dn_filter, group_filter, is_distinguished_name,
    range_selector, ranged_attr, user_from_attrs, user_query_filter, Directory, PERSON_FILTER,
    USER_ATTRIBUTES,
};
use crate::config::DirectoryConf;
use crate::error::{DirectoryError, TranslationError};
use crate::models::UserRecord;
use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapError, Scope, SearchEntry};
use tracing::{debug, info, warn};

/// LDAP result code returned when the search base does not exist.
const NO_SUCH_OBJECT: u32 = 32;

/// One bound connection, held for the lifetime of the process.
///
/// `Ldap` handles are cheap clones over the same connection; calls are
/// still meant to be issued one after the other.
pub struct LdapDirectory {
    ldap: Ldap,
    search_base: String,
}

impl LdapDirectory {
    /// Connect over TLS (`ldaps://`) and bind as `DOMAIN\username`.
    pub async fn connect(
        conf: &DirectoryConf,
        username: &str,
        password: &str,
    ) -> Result<Self, DirectoryError> {
        let url = conf.url();
        let (conn, mut ldap) = LdapConnAsync::new(&url).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!("LDAP connection error: {}", e);
            }
        });

        let bind_name = conf.bind_name(username);
        ldap.simple_bind(&bind_name, password).await?.success()?;
        info!("bound to {} as {}", url, bind_name);

        Ok(Self {
            ldap,
            search_base: conf.search_base.clone(),
        })
    }

    pub async fn close(self) -> Result<(), DirectoryError> {
        let mut ldap = self.ldap;
        ldap.unbind().await?;
        Ok(())
    }

    async fn search(
        &self,
        base: &str,
        scope: Scope,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Vec<SearchEntry>, LdapError> {
        debug!("search base={} filter={}", base, filter);
        let mut ldap = self.ldap.clone();
        let (entries, _) = ldap.search(base, scope, filter, attrs.to_vec()).await?.success()?;
        Ok(entries.into_iter().map(SearchEntry::construct).collect())
    }

    /// All values of `name` on `entry`, fetching the remaining ranges when
    /// AD returned only the first `MaxValRange` of them.
    async fn all_values(&self, entry: &SearchEntry, name: &str) -> Result<Vec<String>, LdapError> {
        let (mut values, mut next) = ranged_attr(&entry.attrs, name);
        while let Some(start) = next {
            let selector = range_selector(name, start);
            let found = self
                .search(&entry.dn, Scope::Base, "(objectClass=*)", &[selector.as_str()])
                .await?;
            let Some(more) = found.first() else { break };
            let (chunk, following) = ranged_attr(&more.attrs, name);
            if chunk.is_empty() {
                break;
            }
            debug!("{} values {}.. of {} for {}", chunk.len(), start, name, entry.dn);
            values.extend(chunk);
            next = following;
        }
        Ok(values)
    }

    async fn user_from_entry(&self, entry: &SearchEntry) -> Result<UserRecord, LdapError> {
        let mut user = user_from_attrs(&entry.dn, &entry.attrs);
        if ranged_attr(&entry.attrs, "memberOf").1.is_some() {
            user.member_of = self.all_values(entry, "memberOf").await?;
        }
        Ok(user)
    }
}

fn is_no_such_object(err: &LdapError) -> bool {
    matches!(err, LdapError::LdapResult { result } if result.rc == NO_SUCH_OBJECT)
}

#[async_trait]
impl Directory for LdapDirectory {
    fn search_base(&self) -> &str {
        &self.search_base
    }

    async fn find_user(&self, key: &str) -> Result<UserRecord, DirectoryError> {
        let found = if is_distinguished_name(key) {
            self.search(key, Scope::Base, PERSON_FILTER, USER_ATTRIBUTES).await
        } else {
            self.search(&self.search_base, Scope::Subtree, &account_filter(key), USER_ATTRIBUTES)
                .await
        };
        let entries = match found {
            Ok(entries) => entries,
            Err(e) if is_no_such_object(&e) => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        match entries.first() {
            Some(entry) => Ok(self.user_from_entry(entry).await?),
            None => Err(DirectoryError::UserNotFound(key.to_string())),
        }
    }

    async fn group_members(&self, group_cn: &str) -> Result<Vec<String>, DirectoryError> {
        let entries = self
            .search(&self.search_base, Scope::Subtree, &group_filter(group_cn), &["member"])
            .await?;
        match entries.first() {
            Some(entry) => Ok(self.all_values(entry, "member").await?),
            None => {
                debug!("group {} not found", group_cn);
                Ok(Vec::new())
            }
        }
    }

    async fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, DirectoryError> {
        let entries = self
            .search(&self.search_base, Scope::Subtree, &user_query_filter(query), USER_ATTRIBUTES)
            .await?;
        let mut users = Vec::with_capacity(entries.len());
        for entry in &entries {
            users.push(self.user_from_entry(entry).await?);
        }
        Ok(users)
    }

    async fn group_display_name(&self, group_dn: &str) -> Result<String, TranslationError> {
        let entries = self
            .search(&self.search_base, Scope::Subtree, &group_dn_filter(group_dn), &["cn"])
            .await
            .map_err(|e| TranslationError::Lookup {
                dn: group_dn.to_string(),
                reason: e.to_string(),
            })?;
        let entry = entries
            .first()
            .ok_or_else(|| TranslationError::NotFound(group_dn.to_string()))?;
        cn_from_attrs(&entry.attrs)
            .ok_or_else(|| TranslationError::MissingName(group_dn.to_string()))
    }
}
