/*!
Builds the long-lived components of the data-plane service from a
static config file: the tenant registry, each tenant's storage manager
wired to the local-filesystem reference backend, the in-memory
reference metadata coordinator, and the reference codec plugins. The
resulting [`Components`] are what a transport binding (out of scope
here) would hold onto for the lifetime of the process.
*/

use std::path::Path;
use std::sync::Arc;

use data_catalog_memory::MemoryCoordinator;
use data_codec_csv::CsvCodec;
use data_codec_json::JsonCodec;
use data_core::pipeline::Codec;
use data_core::tenant::{StaticConfig, TenantRegistry, TenantRuntime};
use data_core::MetadataCoordinator;
use data_storage_local::{LocalStorageBackend, LocalStorageBackendFactory};

use crate::error::Error;

pub struct Components {
    pub registry: Arc<TenantRegistry>,
    pub coordinator: Arc<dyn MetadataCoordinator>,
    pub codecs: Vec<Arc<dyn Codec>>,
}

pub fn load_config(path: &Path) -> Result<StaticConfig, Error> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
        path: path.display().to_string(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| Error::ParseConfig {
        path: path.display().to_string(),
        source,
    })
}

pub async fn build(config: StaticConfig) -> Result<Components, Error> {
    let mut runtimes = Vec::with_capacity(config.tenants.len());
    for (tenant_code, static_config) in config.tenants {
        let runtime = TenantRuntime::new(tenant_code.clone(), static_config.clone());
        for (key, root) in &static_config.resources {
            let backend = Arc::new(LocalStorageBackend::new(root)?);
            runtime.storage_manager_mut().await.add_storage(key.clone(), backend);
        }
        tracing::info!(tenant = %tenant_code, "tenant runtime initialised");
        runtimes.push(runtime);
    }

    let registry = Arc::new(TenantRegistry::new(
        runtimes,
        Arc::new(LocalStorageBackendFactory),
    ));
    let coordinator: Arc<dyn MetadataCoordinator> = Arc::new(MemoryCoordinator::new());
    let codecs: Vec<Arc<dyn Codec>> = vec![Arc::new(CsvCodec), Arc::new(JsonCodec)];

    Ok(Components {
        registry,
        coordinator,
        codecs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn builds_one_runtime_per_configured_tenant() {
        let storage_dir = tempdir().unwrap();
        let yaml = format!(
            "acme:\n  display_name: Acme Corp\n  default_format: text/csv\n  resources:\n    primary: {:?}\n",
            storage_dir.path()
        );
        let config: StaticConfig = serde_yaml::from_str(&yaml).unwrap();

        let components = build(config).await.unwrap();
        assert_eq!(components.registry.tenant_count().await, 1);
        assert_eq!(components.codecs.len(), 2);

        let tenant = components.registry.get("acme").await.unwrap();
        assert!(tenant.storage_manager().await.file_storage("primary").is_some());
    }
}
