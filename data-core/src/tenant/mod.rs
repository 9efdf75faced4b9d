/*!
The tenant runtime registry.
*/

pub mod config;
pub mod registry;

pub use config::{ConfigEntry, ConfigUpdate, ConfigUpdateKind, StaticConfig, StaticTenantConfig};
pub use registry::{StorageBackendFactory, StorageManager, TenantRegistry, TenantRuntime};
