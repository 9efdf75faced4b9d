/*!
Static and dynamic tenant configuration.
*/

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Static tenant config, loaded from the service's config file. Static
/// keys always override a dynamic update addressing the same key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticTenantConfig {
    pub display_name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub secrets: BTreeMap<String, String>,
    pub default_bucket: Option<String>,
    pub default_format: Option<String>,
    #[serde(default)]
    pub resources: BTreeMap<String, String>,
}

/// The top-level config file shape: `tenant_code -> StaticTenantConfig`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticConfig {
    #[serde(flatten)]
    pub tenants: BTreeMap<String, StaticTenantConfig>,
}

/// The kind of mutation a [`ConfigUpdate`] applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigUpdateKind {
    Create,
    Update,
    Delete,
}

/// A dynamic config entry, addressed to a reserved config-class
/// (`trac_config`, `trac_resources`).
#[derive(Debug, Clone)]
pub enum ConfigEntry {
    /// A tenant property key/value pair under `trac_config`.
    Property { key: String, value: String },
    /// A storage resource under `trac_resources`, naming the backend key
    /// a `StorageManager` should add/update/remove.
    Resource { key: String, backend: String },
}

impl ConfigEntry {
    pub fn key(&self) -> &str {
        match self {
            ConfigEntry::Property { key, .. } => key,
            ConfigEntry::Resource { key, .. } => key,
        }
    }
}

/// An event delivered via `apply_config_update`.
#[derive(Debug, Clone)]
pub struct ConfigUpdate {
    pub tenant: String,
    pub entry: ConfigEntry,
    pub kind: ConfigUpdateKind,
}
