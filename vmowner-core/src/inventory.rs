//! Inventory loader.
//!
//! Reads the Ansible style YAML inventory the patching runs are driven
//! from. Only the keys this tool cares about are interpreted; any other
//! host or group variable is ignored.
//!
//! ```yaml
//! all:
//!   hosts:
//!     web01:
//!     web02:
//!       override: true
//!       machine_users: [bob]
//!   vars:
//!     override: false
//! ```

use crate::error::InventoryError;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

/// The override variables, valid both per host and for the whole inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OverrideVars {
    #[serde(default, rename = "override")]
    pub enabled: bool,
    #[serde(default)]
    pub machine_users: Option<Vec<String>>,
}

impl OverrideVars {
    /// The explicit user list, when the override is switched on.
    pub fn users(&self) -> Option<&[String]> {
        if self.enabled {
            self.machine_users.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub id: String,
    pub vars: OverrideVars,
}

/// Hosts in the order they are written, plus the global vars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    pub hosts: Vec<Host>,
    pub vars: OverrideVars,
}

#[derive(Debug, Deserialize)]
struct RawInventory {
    all: Option<RawGroup>,
}

#[derive(Debug, Deserialize)]
struct RawGroup {
    #[serde(default)]
    hosts: Option<Mapping>,
    #[serde(default)]
    vars: Option<OverrideVars>,
}

/// Load and validate an inventory file.
pub fn load_inventory<P: AsRef<Path>>(path: P) -> Result<Inventory, InventoryError> {
    let path = path.as_ref();
    let txt = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let inventory = Inventory::from_yaml_str(&txt)?;
    debug!("loaded {} hosts from {:?}", inventory.hosts.len(), path);
    Ok(inventory)
}

impl Inventory {
    pub fn from_yaml_str(txt: &str) -> Result<Self, InventoryError> {
        let raw: RawInventory = serde_yaml::from_str(txt)?;
        let all = raw.all.ok_or(InventoryError::MissingAll)?;

        let mut hosts = Vec::new();
        for (key, value) in all.hosts.unwrap_or_default() {
            let id = host_key(key)?;
            let vars = match value {
                Value::Null => OverrideVars::default(),
                other => serde_yaml::from_value(other)?,
            };
            if vars.enabled && vars.machine_users.is_none() {
                return Err(InventoryError::MissingMachineUsers {
                    scope: format!("host '{id}'"),
                });
            }
            hosts.push(Host { id, vars });
        }

        let vars = all.vars.unwrap_or_default();
        if vars.enabled && vars.machine_users.is_none() {
            return Err(InventoryError::MissingMachineUsers {
                scope: "inventory vars".into(),
            });
        }

        Ok(Self { hosts, vars })
    }

    pub fn host(&self, id: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.id == id)
    }
}

fn host_key(key: Value) -> Result<String, InventoryError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(InventoryError::InvalidHostKey(format!("{other:?}"))),
    }
}
