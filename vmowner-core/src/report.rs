//! Group membership report for `vmowner-groups`.

use crate::directory::Directory;
use crate::error::DirectoryError;
use crate::models::UserRecord;
use std::collections::HashSet;
use std::fmt::Write as _;
use tracing::warn;

/// How much of an untranslatable DN is echoed back.
pub const ERROR_DN_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupName {
    Resolved(String),
    /// Placeholder text standing in for a group that could not be looked up.
    Unresolved(String),
}

impl GroupName {
    pub fn unresolved(dn: &str) -> Self {
        let short: String = dn.chars().take(ERROR_DN_CHARS).collect();
        GroupName::Unresolved(format!("GROUP ERROR: {short}"))
    }

    pub fn as_str(&self) -> &str {
        match self {
            GroupName::Resolved(name) | GroupName::Unresolved(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberReport {
    pub user: UserRecord,
    pub groups: Vec<GroupName>,
}

impl MemberReport {
    pub fn render(&self) -> String {
        let name = self.user.display_name.as_deref().unwrap_or("");
        let email = self.user.email.as_deref().unwrap_or("No Email");
        let account = self.user.account_name.as_deref().unwrap_or("None");

        let mut out =
            format!("Username: {name}\t email: {email}\nsAMAccountName: {account}\nGroups:\n");
        for group in &self.groups {
            let _ = writeln!(out, "\t{}", group.as_str());
        }
        out
    }
}

/// Users matching `query` (cn or account name), each with the short name of
/// every group they belong to. Users are reported once per account.
pub async fn report<D>(dir: &D, query: &str) -> Result<Vec<MemberReport>, DirectoryError>
where
    D: Directory + ?Sized,
{
    let found = dir.search_users(query).await?;

    let mut seen = HashSet::new();
    let mut reports = Vec::new();
    for user in found {
        let key = user
            .account_name
            .clone()
            .unwrap_or_else(|| user.distinguished_name.clone());
        if !seen.insert(key) {
            continue;
        }

        let mut groups = Vec::with_capacity(user.member_of.len());
        for dn in user.member_of.iter().filter(|dn| !dn.trim().is_empty()) {
            match dir.group_display_name(dn).await {
                Ok(name) => groups.push(GroupName::Resolved(name)),
                Err(e) => {
                    warn!("{}", e);
                    groups.push(GroupName::unresolved(dn));
                }
            }
        }
        reports.push(MemberReport { user, groups });
    }

    Ok(reports)
}
