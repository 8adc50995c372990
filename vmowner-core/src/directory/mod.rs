//! Directory access.
//!
//! The `Directory` trait is the only way the resolver and the reporter talk
//! to the identity store. The handle is always passed in explicitly so tests
//! can swap the LDAP client for an in-memory one.

mod cache;
mod ldap;

pub use cache::CachedDirectory;
pub use ldap::LdapDirectory;

use crate::error::{DirectoryError, TranslationError};
use crate::models::{account_active, UserRecord};
use async_trait::async_trait;
use ldap3::ldap_escape;
use std::collections::HashMap;

/// Attributes requested for every user lookup.
pub const USER_ATTRIBUTES: &[&str] = &[
    "distinguishedName",
    "memberOf",
    "mail",
    "displayName",
    "givenName",
    "sAMAccountName",
    "title",
    "userAccountControl",
];

pub const PERSON_FILTER: &str = "(objectclass=person)";

/// Synchronous request/response access to the identity store, one logical
/// query per call.
#[async_trait]
pub trait Directory: Send + Sync {
    fn search_base(&self) -> &str;

    /// Look up one user by account name, or by DN when `key` starts with `CN=`.
    async fn find_user(&self, key: &str) -> Result<UserRecord, DirectoryError>;

    /// `member` values of the group whose cn is `group_cn`. A group that does
    /// not exist has no members.
    async fn group_members(&self, group_cn: &str) -> Result<Vec<String>, DirectoryError>;

    /// Every user whose cn or account name matches `query`. `*` wildcards
    /// are passed through.
    async fn search_users(&self, query: &str) -> Result<Vec<UserRecord>, DirectoryError>;

    /// Short name (cn) of the group with the given DN.
    async fn group_display_name(&self, group_dn: &str) -> Result<String, TranslationError>;
}

/// Naming convention tying a host to its access group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNaming {
    pattern: String,
}

impl GroupNaming {
    pub const DEFAULT_PATTERN: &'static str = "security_{host}_Access";

    /// `pattern` must contain `{host}`; a pattern without it is used as a
    /// prefix.
    pub fn new<S: Into<String>>(pattern: S) -> Self {
        let mut pattern = pattern.into();
        if !pattern.contains("{host}") {
            pattern.push_str("{host}");
        }
        Self { pattern }
    }

    pub fn group_for(&self, host: &str) -> String {
        self.pattern.replace("{host}", host)
    }
}

impl Default for GroupNaming {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PATTERN)
    }
}

/// True when the lookup key is a distinguished name rather than an account.
pub fn is_distinguished_name(key: &str) -> bool {
    key.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("CN="))
}

pub fn account_filter(account: &str) -> String {
    format!("(sAMAccountName={})", ldap_escape(account))
}

pub fn group_filter(group_cn: &str) -> String {
    format!("(&(objectClass=group)(cn={}))", ldap_escape(group_cn))
}

pub fn group_dn_filter(group_dn: &str) -> String {
    format!("(&(objectClass=group)(distinguishedName={}))", ldap_escape(group_dn))
}

pub fn user_query_filter(query: &str) -> String {
    let q = escape_keep_wildcards(query);
    format!("(|(cn={q})(sAMAccountName={q}))")
}

/// Escape everything but `*`, so partial matches such as `jo*` still work.
fn escape_keep_wildcards(value: &str) -> String {
    value
        .split('*')
        .map(|part| ldap_escape(part).into_owned())
        .collect::<Vec<_>>()
        .join("*")
}

/// Attribute lookups are case-insensitive: servers do not always echo the
/// requested spelling.
fn attr<'a>(attrs: &'a HashMap<String, Vec<String>>, name: &str) -> Option<&'a Vec<String>> {
    attrs
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

/// Values of a multi-valued attribute that AD may split into ranges
/// (`member;range=0-1499`), plus the first index of the next range. The
/// last range ends in `*` and has no successor.
pub fn ranged_attr(
    attrs: &HashMap<String, Vec<String>>,
    name: &str,
) -> (Vec<String>, Option<usize>) {
    for (key, values) in attrs {
        let (base, option) = match key.split_once(';') {
            Some((base, option)) => (base, Some(option)),
            None => (key.as_str(), None),
        };
        if !base.eq_ignore_ascii_case(name) {
            continue;
        }
        let next = option.and_then(next_range_start);
        return (values.clone(), next);
    }
    (Vec::new(), None)
}

fn next_range_start(option: &str) -> Option<usize> {
    let (tag, bounds) = option.split_once('=')?;
    if !tag.eq_ignore_ascii_case("range") {
        return None;
    }
    let (_, high) = bounds.split_once('-')?;
    high.parse::<usize>().ok().map(|h| h + 1)
}

/// Attribute selector asking for the values from `start` onwards.
pub fn range_selector(name: &str, start: usize) -> String {
    format!("{name};range={start}-*")
}

fn first_attr(attrs: &HashMap<String, Vec<String>>, name: &str) -> Option<String> {
    attr(attrs, name).and_then(|values| values.first().cloned())
}

/// Build a `UserRecord` from a search entry's DN and attribute map.
pub fn user_from_attrs(dn: &str, attrs: &HashMap<String, Vec<String>>) -> UserRecord {
    let account_control =
        first_attr(attrs, "userAccountControl").and_then(|v| v.trim().parse().ok());
    UserRecord {
        email: first_attr(attrs, "mail"),
        display_name: first_attr(attrs, "displayName"),
        given_name: first_attr(attrs, "givenName"),
        account_name: first_attr(attrs, "sAMAccountName"),
        title: first_attr(attrs, "title"),
        distinguished_name: first_attr(attrs, "distinguishedName")
            .unwrap_or_else(|| dn.to_string()),
        member_of: ranged_attr(attrs, "memberOf").0,
        active: account_active(account_control),
    }
}

pub fn cn_from_attrs(attrs: &HashMap<String, Vec<String>>) -> Option<String> {
    first_attr(attrs, "cn")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_group_naming() {
        let naming = GroupNaming::default();
        assert_eq!(naming.group_for("web01"), "security_web01_Access");

        let naming = GroupNaming::new("vm-{host}-users");
        assert_eq!(naming.group_for("db01"), "vm-db01-users");

        let naming = GroupNaming::new("acl_");
        assert_eq!(naming.group_for("db01"), "acl_db01");
    }

    #[test]
    fn test_distinguished_name_detection() {
        assert!(is_distinguished_name("CN=Alice,OU=Staff,DC=example,DC=org"));
        assert!(is_distinguished_name("cn=alice,dc=example"));
        assert!(!is_distinguished_name("alice"));
        assert!(!is_distinguished_name("CN"));
        assert!(!is_distinguished_name(""));
    }

    #[test]
    fn test_filters_escape_input() {
        assert_eq!(account_filter("alice"), "(sAMAccountName=alice)");
        assert_eq!(account_filter("a*)(uid=*"), "(sAMAccountName=a\\2a\\29\\28uid=\\2a)");
        assert_eq!(
            group_filter("security_web01_Access"),
            "(&(objectClass=group)(cn=security_web01_Access))"
        );
    }

    #[test]
    fn test_user_query_keeps_wildcards() {
        assert_eq!(user_query_filter("jo*"), "(|(cn=jo*)(sAMAccountName=jo*))");
        assert_eq!(
            user_query_filter("Smith (IT)"),
            "(|(cn=Smith \\28IT\\29)(sAMAccountName=Smith \\28IT\\29))"
        );
    }

    #[test]
    fn test_user_from_attrs() {
        let a = attrs(&[
            ("mail", &["alice@example.org"]),
            ("displayname", &["Alice Liddell"]),
            ("givenName", &["Alice"]),
            ("sAMAccountName", &["alice"]),
            ("memberOf", &["CN=g1,DC=example", "CN=g2,DC=example"]),
            ("userAccountControl", &["512"]),
        ]);
        let user = user_from_attrs("CN=Alice,DC=example", &a);
        assert_eq!(user.email.as_deref(), Some("alice@example.org"));
        assert_eq!(user.display_name.as_deref(), Some("Alice Liddell"));
        assert_eq!(user.distinguished_name, "CN=Alice,DC=example");
        assert_eq!(user.member_of.len(), 2);
        assert_eq!(user.title, None);
        assert!(user.active);
    }

    #[test]
    fn test_disabled_and_missing_mail() {
        let a = attrs(&[("sAMAccountName", &["bob"]), ("userAccountControl", &["514"])]);
        let user = user_from_attrs("CN=Bob,DC=example", &a);
        assert_eq!(user.email, None);
        assert!(!user.active);
    }

    #[test]
    fn test_group_attrs() {
        let a = attrs(&[("member", &["CN=Alice,DC=example"]), ("cn", &["admins"])]);
        assert_eq!(ranged_attr(&a, "member").0, vec!["CN=Alice,DC=example".to_string()]);
        assert_eq!(cn_from_attrs(&a).as_deref(), Some("admins"));
        assert!(ranged_attr(&HashMap::new(), "member").0.is_empty());
    }

    #[test]
    fn test_ranged_members() {
        let a = attrs(&[("member;range=0-1499", &["CN=Alice,DC=example"])]);
        assert_eq!(
            ranged_attr(&a, "member"),
            (vec!["CN=Alice,DC=example".to_string()], Some(1500))
        );

        let last = attrs(&[("member;range=1500-*", &["CN=Bob,DC=example"])]);
        assert_eq!(ranged_attr(&last, "member"), (vec!["CN=Bob,DC=example".to_string()], None));

        assert_eq!(ranged_attr(&attrs(&[("member", &["CN=C,DC=example"])]), "member").1, None);
        assert_eq!(range_selector("member", 1500), "member;range=1500-*");
    }

    #[test]
    fn test_ranged_member_of() {
        let a = attrs(&[("memberOf;Range=0-1", &["CN=g1,DC=example", "CN=g2,DC=example"])]);
        let user = user_from_attrs("CN=Alice,DC=example", &a);
        assert_eq!(user.member_of.len(), 2);
        assert_eq!(ranged_attr(&a, "memberof").1, Some(2));
    }

    #[test]
    fn test_unparseable_account_control_is_active() {
        let a = attrs(&[("sAMAccountName", &["carol"]), ("userAccountControl", &["abc"])]);
        assert!(user_from_attrs("CN=Carol,DC=example", &a).active);
    }
}
