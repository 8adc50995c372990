//! Decides who the users of each inventory host are.
//!
//! Precedence, lowest to highest:
//! 1. members of the host's access group (see `GroupNaming`)
//! 2. the host's own `machine_users` when its `override` is true
//! 3. the inventory-wide `machine_users` when the global `override` is true
//!
//! The group is only queried when neither override applies.

use crate::directory::{Directory, GroupNaming};
use crate::error::DirectoryError;
use crate::inventory::{Host, Inventory};
use crate::models::HostUsers;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSource {
    Group,
    HostOverride,
    GlobalOverride,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub source: UserSource,
    /// Account names or DNs, ready for `Directory::find_user`.
    pub users: Vec<String>,
}

pub async fn resolve_host_users<D>(
    dir: &D,
    naming: &GroupNaming,
    inventory: &Inventory,
    host: &Host,
) -> Result<Resolution, DirectoryError>
where
    D: Directory + ?Sized,
{
    let resolution = if let Some(users) = inventory.vars.users() {
        Resolution {
            source: UserSource::GlobalOverride,
            users: users.to_vec(),
        }
    } else if let Some(users) = host.vars.users() {
        Resolution {
            source: UserSource::HostOverride,
            users: users.to_vec(),
        }
    } else {
        let group = naming.group_for(&host.id);
        let users = dir.group_members(&group).await?;
        if users.is_empty() {
            info!("{}: group {} has no members or does not exist", host.id, group);
        }
        Resolution {
            source: UserSource::Group,
            users,
        }
    };
    debug!("{}: {} users from {:?}", host.id, resolution.users.len(), resolution.source);
    Ok(resolution)
}

/// Resolve every host, in inventory order, down to full user records.
pub async fn resolve_inventory<D>(
    dir: &D,
    naming: &GroupNaming,
    inventory: &Inventory,
) -> Result<Vec<HostUsers>, DirectoryError>
where
    D: Directory + ?Sized,
{
    let mut resolved = Vec::with_capacity(inventory.hosts.len());
    for host in &inventory.hosts {
        let resolution = resolve_host_users(dir, naming, inventory, host).await?;
        let mut users = Vec::with_capacity(resolution.users.len());
        for key in &resolution.users {
            users.push(dir.find_user(key).await?);
        }
        resolved.push(HostUsers {
            host: host.id.clone(),
            users,
        });
    }
    Ok(resolved)
}
