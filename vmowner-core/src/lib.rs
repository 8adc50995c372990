/*!
# vmowner core

Shared logic behind the `vmowner-notify` and `vmowner-groups` tools:

- `inventory` : YAML inventory loader (hosts, per-host and global override vars)
- `directory` : the `Directory` trait, its LDAP implementation and a lookup cache
- `resolver`  : decides which users belong to each host
- `aggregate` : inverts host -> users into one notification per recipient
- `dispatch`  : dry-run / live delivery of those notifications through a `Notifier`
- `report`    : group membership report with short group names
- `config`    : YAML tool configuration with defaults
*/

pub mod aggregate;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod inventory;
pub mod models;
pub mod report;
pub mod resolver;

pub use aggregate::{aggregate, Aggregation};
pub use config::{load_config, ToolConfig};
pub use directory::{CachedDirectory, Directory, GroupNaming, LdapDirectory};
pub use dispatch::{dispatch, DispatchReport, Notice, Notifier, Outcome, RunMode};
pub use error::{ConfigError, DirectoryError, InventoryError, NotifyError, TranslationError};
pub use inventory::{load_inventory, Inventory};
pub use models::{HostUsers, Notification, NotificationDetails, Recipient, UserRecord};
pub use report::{report, GroupName, MemberReport};
pub use resolver::{resolve_host_users, resolve_inventory, Resolution, UserSource};
