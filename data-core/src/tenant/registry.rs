/*!
The tenant runtime registry: process-wide state keyed by
`tenant_code`, lazily initialised from a bootstrap tenant list and torn
down on process shutdown.
*/

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Error;
use crate::pipeline::StorageBackend;
use crate::tenant::config::{ConfigEntry, ConfigUpdate, ConfigUpdateKind, StaticTenantConfig};

/// Builds a [`StorageBackend`] from a `trac_resources` entry's `backend`
/// string. Implemented by whichever storage plugin the service is wired
/// with (e.g. the local-filesystem reference backend); the registry
/// itself stays agnostic of any concrete backend type.
#[async_trait]
pub trait StorageBackendFactory: Send + Sync {
    async fn build(&self, backend: &str) -> Result<Arc<dyn StorageBackend>, Error>;
}

/// A tenant's key -> backend map, plus its default bucket/format.
pub struct StorageManager {
    backends: HashMap<String, Arc<dyn StorageBackend>>,
    default_location: Option<String>,
    default_format: Option<String>,
}

impl StorageManager {
    pub fn new(default_location: Option<String>, default_format: Option<String>) -> Self {
        StorageManager {
            backends: HashMap::new(),
            default_location,
            default_format,
        }
    }

    pub fn file_storage(&self, key: &str) -> Option<Arc<dyn StorageBackend>> {
        self.backends.get(key).cloned()
    }

    pub fn data_storage(&self, key: &str) -> Option<Arc<dyn StorageBackend>> {
        self.backends.get(key).cloned()
    }

    pub fn default_location(&self) -> Option<&str> {
        self.default_location.as_deref()
    }

    pub fn default_format(&self) -> Option<&str> {
        self.default_format.as_deref()
    }

    pub fn add_storage(&mut self, key: String, backend: Arc<dyn StorageBackend>) {
        self.backends.insert(key, backend);
    }

    pub fn update_storage(&mut self, key: String, backend: Arc<dyn StorageBackend>) {
        self.backends.insert(key, backend);
    }

    pub fn remove_storage(&mut self, key: &str) -> Option<Arc<dyn StorageBackend>> {
        self.backends.remove(key)
    }

    async fn shutdown(&self) {
        for (key, backend) in &self.backends {
            if let Err(err) = backend.shutdown().await {
                tracing::warn!(storage_key = %key, error = %err, "storage backend shutdown failed, continuing");
            }
        }
    }
}

/// Live (catalogue-merged) tenant properties, re-merged atomically with
/// static properties on every dynamic update.
#[derive(Debug, Clone, Default)]
pub struct LiveProperties {
    pub merged: HashMap<String, String>,
}

/// One tenant's runtime state: static config, live config, and its
/// storage manager.
pub struct TenantRuntime {
    pub tenant_code: String,
    pub static_config: StaticTenantConfig,
    live: RwLock<LiveProperties>,
    storage: RwLock<StorageManager>,
}

impl TenantRuntime {
    pub fn new(tenant_code: impl Into<String>, static_config: StaticTenantConfig) -> Self {
        let storage = StorageManager::new(
            static_config.default_bucket.clone(),
            static_config.default_format.clone(),
        );
        let live = LiveProperties {
            merged: static_config.properties.clone(),
        };
        TenantRuntime {
            tenant_code: tenant_code.into(),
            static_config,
            live: RwLock::new(live),
            storage: RwLock::new(storage),
        }
    }

    pub async fn storage_manager(&self) -> tokio::sync::RwLockReadGuard<'_, StorageManager> {
        self.storage.read().await
    }

    pub async fn storage_manager_mut(&self) -> tokio::sync::RwLockWriteGuard<'_, StorageManager> {
        self.storage.write().await
    }

    pub async fn live_properties(&self) -> LiveProperties {
        self.live.read().await.clone()
    }

    /// A dynamic entry is not relevant if it addresses a static config
    /// key; static always overrides dynamic.
    fn is_relevant(&self, entry: &ConfigEntry) -> bool {
        match entry {
            ConfigEntry::Property { key, .. } => !self.static_config.properties.contains_key(key),
            ConfigEntry::Resource { key, .. } => !self.static_config.resources.contains_key(key),
        }
    }

    async fn apply(
        &self,
        entry: &ConfigEntry,
        kind: ConfigUpdateKind,
        factory: &dyn StorageBackendFactory,
    ) -> Result<(), Error> {
        if !self.is_relevant(entry) {
            return Ok(());
        }
        match entry {
            ConfigEntry::Property { key, value } => {
                let mut live = self.live.write().await;
                match kind {
                    ConfigUpdateKind::Create | ConfigUpdateKind::Update => {
                        live.merged.insert(key.clone(), value.clone());
                    }
                    ConfigUpdateKind::Delete => {
                        live.merged.remove(key);
                    }
                }
                // Re-merge static + dynamic atomically under the same guard.
                for (k, v) in &self.static_config.properties {
                    live.merged.insert(k.clone(), v.clone());
                }
            }
            ConfigEntry::Resource { key, backend } => match kind {
                ConfigUpdateKind::Create => {
                    let built = factory.build(backend).await?;
                    self.storage.write().await.add_storage(key.clone(), built);
                }
                ConfigUpdateKind::Update => {
                    let built = factory.build(backend).await?;
                    self.storage.write().await.update_storage(key.clone(), built);
                }
                ConfigUpdateKind::Delete => {
                    self.storage.write().await.remove_storage(key);
                }
            },
        }
        Ok(())
    }
}

/// The process-wide tenant registry. Concurrent updates on the same
/// tenant are serialised by that tenant's own locks; concurrent updates
/// on different tenants run in parallel.
pub struct TenantRegistry {
    tenants: RwLock<HashMap<String, Arc<TenantRuntime>>>,
    storage_factory: Arc<dyn StorageBackendFactory>,
}

impl TenantRegistry {
    /// Build the registry from the bootstrap tenant list, lazily
    /// initialised on first use after a bootstrap list-tenants query.
    /// `storage_factory` builds the backend a dynamic `trac_resources`
    /// create/update addresses.
    pub fn new(
        tenants: impl IntoIterator<Item = TenantRuntime>,
        storage_factory: Arc<dyn StorageBackendFactory>,
    ) -> Self {
        let map = tenants
            .into_iter()
            .map(|t| (t.tenant_code.clone(), Arc::new(t)))
            .collect();
        TenantRegistry {
            tenants: RwLock::new(map),
            storage_factory,
        }
    }

    /// Number of tenants currently registered.
    pub async fn tenant_count(&self) -> usize {
        self.tenants.read().await.len()
    }

    pub async fn get(&self, tenant_code: &str) -> Result<Arc<TenantRuntime>, Error> {
        self.tenants
            .read()
            .await
            .get(tenant_code)
            .cloned()
            .ok_or_else(|| Error::TenantNotFound(tenant_code.to_string()))
    }

    /// Apply a dynamic config update. Silently ignored if the tenant is
    /// unknown, the key is static, or the tenant reports it irrelevant —
    /// these are not request errors, just no-ops.
    pub async fn apply_config_update(&self, update: ConfigUpdate) -> Result<(), Error> {
        let tenants = self.tenants.read().await;
        let Some(tenant) = tenants.get(&update.tenant) else {
            return Ok(());
        };
        tenant
            .apply(&update.entry, update.kind, self.storage_factory.as_ref())
            .await
    }

    /// Shut down every tenant's storage manager in order, logging but
    /// swallowing per-tenant failures.
    pub async fn shutdown(&self) {
        let tenants = self.tenants.read().await;
        for (code, tenant) in tenants.iter() {
            tracing::info!(tenant = %code, "shutting down tenant storage manager");
            tenant.storage.read().await.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_storage_local::LocalStorageBackendFactory;
    use tempfile::tempdir;

    fn static_config() -> StaticTenantConfig {
        StaticTenantConfig {
            display_name: "Acme Corp".to_string(),
            properties: Default::default(),
            secrets: Default::default(),
            default_bucket: None,
            default_format: None,
            resources: Default::default(),
        }
    }

    #[tokio::test]
    async fn dynamic_resource_create_update_delete_round_trips() {
        let registry = TenantRegistry::new(
            [TenantRuntime::new("acme", static_config())],
            Arc::new(LocalStorageBackendFactory),
        );
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();

        registry
            .apply_config_update(ConfigUpdate {
                tenant: "acme".to_string(),
                entry: ConfigEntry::Resource {
                    key: "primary".to_string(),
                    backend: first.path().display().to_string(),
                },
                kind: ConfigUpdateKind::Create,
            })
            .await
            .unwrap();
        let tenant = registry.get("acme").await.unwrap();
        assert!(tenant.storage_manager().await.file_storage("primary").is_some());

        registry
            .apply_config_update(ConfigUpdate {
                tenant: "acme".to_string(),
                entry: ConfigEntry::Resource {
                    key: "primary".to_string(),
                    backend: second.path().display().to_string(),
                },
                kind: ConfigUpdateKind::Update,
            })
            .await
            .unwrap();
        assert!(tenant.storage_manager().await.file_storage("primary").is_some());

        registry
            .apply_config_update(ConfigUpdate {
                tenant: "acme".to_string(),
                entry: ConfigEntry::Resource {
                    key: "primary".to_string(),
                    backend: second.path().display().to_string(),
                },
                kind: ConfigUpdateKind::Delete,
            })
            .await
            .unwrap();
        assert!(tenant.storage_manager().await.file_storage("primary").is_none());
    }
}
