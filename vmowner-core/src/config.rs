//! Tool configuration.
//!
//! Looked up in this order: explicit path (`--config`), `VMOWNER_CONFIG`,
//! then `vmowner.yaml` in the working directory. An explicit path must
//! exist. Otherwise a missing or empty file means defaults; a malformed one
//! is an error.

use crate::directory::GroupNaming;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub const CONFIG_ENV: &str = "VMOWNER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "vmowner.yaml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    pub directory: DirectoryConf,
    pub mail: MailConf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConf {
    /// FQDN of the directory server, or a full `ldap://` / `ldaps://` URL.
    pub server: String,
    pub search_base: String,
    /// NetBIOS domain prepended to the bind account.
    pub domain: String,
    /// Access group naming, `{host}` is replaced by the inventory host.
    pub group_pattern: String,
    pub cache_lookups: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConf {
    /// Unauthenticated relay.
    pub relay: String,
    pub port: u16,
    pub from: String,
}

impl Default for DirectoryConf {
    fn default() -> Self {
        Self {
            server: "adserver.domain.com.au".into(),
            search_base: "dc=your,dc=domain,dc=com,dc=au".into(),
            domain: "domain".into(),
            group_pattern: GroupNaming::DEFAULT_PATTERN.into(),
            cache_lookups: true,
        }
    }
}

impl Default for MailConf {
    fn default() -> Self {
        Self {
            relay: "10.0.0.1".into(),
            port: 25,
            from: "noreply@your.domain.com.au".into(),
        }
    }
}

impl DirectoryConf {
    pub fn url(&self) -> String {
        if self.server.contains("://") {
            self.server.clone()
        } else {
            format!("ldaps://{}", self.server)
        }
    }

    /// `DOMAIN\user`, unless the account is already qualified.
    pub fn bind_name(&self, username: &str) -> String {
        if username.contains('\\') || username.contains('@') || self.domain.is_empty() {
            username.to_string()
        } else {
            format!("{}\\{}", self.domain, username)
        }
    }

    /// Bare `sAMAccountName` of a possibly qualified account
    /// (`DOMAIN\user` or `user@realm`).
    pub fn account_name<'a>(&self, username: &'a str) -> &'a str {
        if let Some((_, account)) = username.rsplit_once('\\') {
            account
        } else if let Some((account, _)) = username.split_once('@') {
            account
        } else {
            username
        }
    }

    pub fn group_naming(&self) -> GroupNaming {
        GroupNaming::new(self.group_pattern.clone())
    }
}

impl ToolConfig {
    /// Apply `--server` / `--searchbase` from the command line.
    pub fn with_overrides(mut self, server: Option<String>, search_base: Option<String>) -> Self {
        if let Some(server) = server {
            self.directory.server = server;
        }
        if let Some(search_base) = search_base {
            self.directory.search_base = search_base;
        }
        self
    }
}

fn implicit_config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
}

pub async fn load_config(explicit: Option<&Path>) -> Result<ToolConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = implicit_config_path();
            if !path.exists() {
                info!("no config at {:?}, using defaults", path);
                return Ok(ToolConfig::default());
            }
            path
        }
    };
    let txt = fs::read_to_string(&path)
        .await
        .map_err(|source| ConfigError::Read { path: path.clone(), source })?;
    if txt.trim().is_empty() {
        return Ok(ToolConfig::default());
    }
    let cfg = serde_yaml::from_str(&txt)
        .map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
    debug!("loaded config from {:?}", path);
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = ToolConfig::default();
        assert_eq!(cfg.directory.url(), "ldaps://adserver.domain.com.au");
        assert_eq!(cfg.directory.group_naming().group_for("web01"), "security_web01_Access");
        assert_eq!(cfg.mail.port, 25);
    }

    #[test]
    fn test_bind_name() {
        let conf = DirectoryConf::default();
        assert_eq!(conf.bind_name("jdoe"), "domain\\jdoe");
        assert_eq!(conf.bind_name("CORP\\jdoe"), "CORP\\jdoe");
        assert_eq!(conf.bind_name("jdoe@corp.example"), "jdoe@corp.example");
    }

    #[test]
    fn test_account_name_strips_qualification() {
        let conf = DirectoryConf::default();
        assert_eq!(conf.account_name("jdoe"), "jdoe");
        assert_eq!(conf.account_name("CORP\\jdoe"), "jdoe");
        assert_eq!(conf.account_name("jdoe@corp.example"), "jdoe");
    }

    #[test]
    fn test_cli_overrides_affect_the_right_fields() {
        let cfg = ToolConfig::default().with_overrides(None, Some("ou=Staff,dc=example".into()));
        assert_eq!(cfg.directory.server, "adserver.domain.com.au");
        assert_eq!(cfg.directory.search_base, "ou=Staff,dc=example");

        let cfg = cfg.with_overrides(Some("ldap://dc1.example:389".into()), None);
        assert_eq!(cfg.directory.url(), "ldap://dc1.example:389");
    }

    #[tokio::test]
    async fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "directory:\n  domain: CORP\nmail:\n  relay: smtp.example.org").unwrap();
        let cfg = load_config(Some(file.path())).await.unwrap();
        assert_eq!(cfg.directory.domain, "CORP");
        assert_eq!(cfg.directory.search_base, DirectoryConf::default().search_base);
        assert_eq!(cfg.mail.relay, "smtp.example.org");
        assert_eq!(cfg.mail.port, 25);
    }

    #[tokio::test]
    async fn test_missing_and_invalid_files() {
        let err = load_config(Some(Path::new("/nonexistent/vmowner.yaml"))).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mail:\n  port: not-a-port").unwrap();
        let err = load_config(Some(file.path())).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_env_path_and_implicit_fallback() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "directory:\n  domain: ENVCORP").unwrap();

        std::env::set_var(CONFIG_ENV, file.path());
        assert_eq!(implicit_config_path(), file.path());
        let cfg = load_config(None).await.unwrap();
        assert_eq!(cfg.directory.domain, "ENVCORP");

        std::env::set_var(CONFIG_ENV, "/nonexistent/vmowner.yaml");
        assert_eq!(load_config(None).await.unwrap(), ToolConfig::default());

        std::env::remove_var(CONFIG_ENV);
        assert_eq!(implicit_config_path(), PathBuf::from(DEFAULT_CONFIG_FILE));
    }
}
