/*!
An in-memory [`MetadataCoordinator`]: keeps every committed
object version and tag in process memory behind one lock, so it
enforces the same version/tag sequencing invariants a real catalogue
would, without talking to a database.

Meant for tests and for running the service locally; it is not a
production catalogue — it loses all state on restart and serialises
every write behind a single mutex.
*/

use std::collections::HashMap;

use async_trait::async_trait;
use data_core::coordinator::{MetadataCoordinator, WriteBatch, WriteBatchResult};
use data_core::error::Error;
use data_core::version_guard;
use data_core_spec::{ObjectHeader, ObjectType, Selector, Tag, TagSelector, TagUpdate, VersionSelector};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Every tag ever committed for one object version, ordered by tag_version.
#[derive(Debug, Clone, Default)]
struct VersionRecord {
    tags: Vec<Tag>,
}

/// Every version ever committed for one object id, ordered by object_version.
#[derive(Debug, Clone)]
struct ObjectRecord {
    object_type: ObjectType,
    versions: Vec<VersionRecord>,
}

impl ObjectRecord {
    fn preallocated(object_type: ObjectType) -> Self {
        ObjectRecord {
            object_type,
            versions: Vec::new(),
        }
    }

    /// `object_version` of the latest committed version, or 0 if only pre-allocated.
    fn latest_version(&self) -> u64 {
        self.versions.len() as u64
    }
}

type TenantStore = HashMap<Uuid, ObjectRecord>;

/// An in-memory [`MetadataCoordinator`], one store per tenant.
#[derive(Debug, Default)]
pub struct MemoryCoordinator {
    tenants: RwLock<HashMap<String, TenantStore>>,
}

impl MemoryCoordinator {
    pub fn new() -> Self {
        MemoryCoordinator::default()
    }

    fn resolve_tag<'a>(record: &'a ObjectRecord, selector: &Selector) -> Result<&'a Tag, Error> {
        let version_index = match selector.version {
            VersionSelector::Latest => record.versions.len().checked_sub(1).ok_or_else(|| {
                Error::Missing(format!("{} has no committed version", selector.object_id))
            })?,
            VersionSelector::Explicit(v) => {
                (v as usize).checked_sub(1).ok_or_else(|| {
                    Error::Missing(format!("{} has no version 0", selector.object_id))
                })?
            }
        };
        let version = record.versions.get(version_index).ok_or_else(|| {
            Error::Missing(format!(
                "{} has no version {}",
                selector.object_id, version_index + 1
            ))
        })?;
        let tag_index = match selector.tag {
            TagSelector::Latest => version.tags.len().checked_sub(1).ok_or_else(|| {
                Error::Missing(format!("{} has no committed tag", selector.object_id))
            })?,
            TagSelector::Explicit(t) => (t as usize).checked_sub(1).ok_or_else(|| {
                Error::Missing(format!("{} has no tag 0", selector.object_id))
            })?,
        };
        version.tags.get(tag_index).ok_or_else(|| {
            Error::Missing(format!(
                "{} version has no tag {}",
                selector.object_id,
                tag_index + 1
            ))
        })
    }

    fn new_tag(
        tenant: &str,
        object_id: Uuid,
        object_type: ObjectType,
        object_version: u64,
        tag_updates: &[TagUpdate],
        definition: serde_json::Value,
    ) -> Result<Tag, Error> {
        let header = ObjectHeader {
            tenant: tenant.to_string(),
            object_type,
            object_id,
            object_version,
            tag_version: 1,
            timestamp: chrono::Utc::now(),
        };
        let mut tag = Tag::new(header);
        tag.apply_all(tag_updates)?;
        tag.apply(&TagUpdate::create("definition", definition))?;
        Ok(tag)
    }
}

#[async_trait]
impl MetadataCoordinator for MemoryCoordinator {
    async fn preallocate_batch(
        &self,
        tenant: &str,
        kinds: &[ObjectType],
    ) -> Result<Vec<ObjectHeader>, Error> {
        let mut tenants = self.tenants.write().await;
        let store = tenants.entry(tenant.to_string()).or_default();
        let mut headers = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let object_id = Uuid::new_v4();
            store.insert(object_id, ObjectRecord::preallocated(*kind));
            headers.push(ObjectHeader::preallocated(tenant, *kind, object_id));
        }
        Ok(headers)
    }

    async fn read_object(&self, tenant: &str, selector: &Selector) -> Result<Tag, Error> {
        let tenants = self.tenants.read().await;
        let store = tenants
            .get(tenant)
            .ok_or_else(|| Error::TenantNotFound(tenant.to_string()))?;
        let record = store
            .get(&selector.object_id)
            .ok_or_else(|| Error::Missing(format!("{} not found", selector.object_id)))?;
        Self::resolve_tag(record, selector).cloned()
    }

    async fn read_batch(&self, tenant: &str, selectors: &[Selector]) -> Result<Vec<Tag>, Error> {
        let mut out = Vec::with_capacity(selectors.len());
        for selector in selectors {
            out.push(self.read_object(tenant, selector).await?);
        }
        Ok(out)
    }

    async fn write_batch(&self, tenant: &str, batch: WriteBatch) -> Result<WriteBatchResult, Error> {
        let mut tenants = self.tenants.write().await;
        let store = tenants.entry(tenant.to_string()).or_default();

        // Validate every entry before mutating anything: either the whole
        // batch commits, or none of it does.
        for entry in &batch.create_preallocated {
            let record = store
                .get(&entry.object_id)
                .ok_or_else(|| Error::Missing(format!("{} was not pre-allocated", entry.object_id)))?;
            if record.object_type != entry.object_type {
                return Err(Error::WrongType(format!(
                    "{} pre-allocated as {:?}, committed as {:?}",
                    entry.object_id, record.object_type, entry.object_type
                )));
            }
            if !record.versions.is_empty() {
                return Err(Error::Duplicate(format!(
                    "{} already has a committed version",
                    entry.object_id
                )));
            }
        }
        for entry in &batch.update_object {
            let record = store
                .get(&entry.object_id)
                .ok_or_else(|| Error::Missing(format!("{} not found", entry.object_id)))?;
            if record.object_type != entry.object_type {
                return Err(Error::WrongType(format!(
                    "{} is {:?}, not {:?}",
                    entry.object_id, record.object_type, entry.object_type
                )));
            }
            // A concurrent writer that already advanced past `prior_version`
            // has necessarily already created the version this entry is
            // targeting (object_version is contiguous) — that is a lost
            // update, reported as DUPLICATE, not a malformed request.
            if record.latest_version() > entry.prior_version {
                return Err(Error::Duplicate(format!(
                    "{} version {} already exists: concurrent writer won the race",
                    entry.object_id,
                    entry.prior_version + 1
                )));
            }
            if record.latest_version() < entry.prior_version {
                return Err(Error::VersionInvalid(format!(
                    "{} is at version {}, update targeted prior version {}",
                    entry.object_id,
                    record.latest_version(),
                    entry.prior_version
                )));
            }
        }

        let mut preallocated = Vec::with_capacity(batch.preallocate.len());
        for request in &batch.preallocate {
            let object_id = Uuid::new_v4();
            store.insert(object_id, ObjectRecord::preallocated(request.object_type));
            preallocated.push(ObjectHeader::preallocated(tenant, request.object_type, object_id));
        }

        let mut created = Vec::with_capacity(batch.create_preallocated.len());
        for entry in batch.create_preallocated {
            let tag = Self::new_tag(
                tenant,
                entry.object_id,
                entry.object_type,
                1,
                &entry.tag_updates,
                entry.definition,
            )?;
            let header = tag.header.clone();
            let record = store.get_mut(&entry.object_id).expect("validated above");
            record.versions.push(VersionRecord { tags: vec![tag] });
            created.push(header);
        }

        let mut updated = Vec::with_capacity(batch.update_object.len());
        for entry in batch.update_object {
            let new_version = entry.prior_version + 1;
            let tag = Self::new_tag(
                tenant,
                entry.object_id,
                entry.object_type,
                new_version,
                &entry.tag_updates,
                entry.definition,
            )?;
            let header = tag.header.clone();
            let record = store.get_mut(&entry.object_id).expect("validated above");
            record.versions.push(VersionRecord { tags: vec![tag] });
            updated.push(header);
        }

        tracing::debug!(
            tenant,
            preallocated = preallocated.len(),
            created = created.len(),
            updated = updated.len(),
            "committed write batch"
        );
        Ok(WriteBatchResult {
            preallocated,
            created,
            updated,
        })
    }

    async fn save_new_tag(
        &self,
        tenant: &str,
        object_id: Uuid,
        object_version: u64,
        expected_prior_tag_version: u64,
        tag_updates: Vec<TagUpdate>,
    ) -> Result<ObjectHeader, Error> {
        let mut tenants = self.tenants.write().await;
        let store = tenants
            .get_mut(tenant)
            .ok_or_else(|| Error::TenantNotFound(tenant.to_string()))?;
        let record = store
            .get_mut(&object_id)
            .ok_or_else(|| Error::Missing(format!("{object_id} not found")))?;
        let version_index = (object_version as usize).checked_sub(1).ok_or_else(|| {
            Error::Missing(format!("{object_id} has no version 0"))
        })?;
        let version = record.versions.get_mut(version_index).ok_or_else(|| {
            Error::Missing(format!(
                "{object_id} version {object_version} has not been committed yet"
            ))
        })?;
        let prior_tag = version
            .tags
            .last()
            .ok_or_else(|| Error::Missing(format!("{object_id} version {object_version} has no tag")))?;

        // A concurrent saver that already advanced the tag chain past
        // expected_prior_tag_version has necessarily already committed the
        // tag this call targets: reported as Duplicate, same as a lost
        // object update in write_batch.
        version_guard::check_tag_sequence(prior_tag.header.tag_version, expected_prior_tag_version + 1)?;

        let mut new_tag = prior_tag.clone();
        new_tag.header.tag_version = prior_tag.header.tag_version + 1;
        new_tag.header.timestamp = chrono::Utc::now();
        new_tag.apply_all(&tag_updates)?;

        let header = new_tag.header.clone();
        version.tags.push(new_tag);
        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use data_core::coordinator::{CreatePreallocatedEntry, UpdateObjectEntry};

    fn entry(object_id: Uuid, object_type: ObjectType) -> CreatePreallocatedEntry {
        CreatePreallocatedEntry {
            object_id,
            object_type,
            tag_updates: vec![],
            definition: serde_json::json!({"v": 1}),
        }
    }

    #[tokio::test]
    async fn preallocate_then_create_round_trips() {
        let coordinator = MemoryCoordinator::new();
        let headers = coordinator
            .preallocate_batch("tenant-a", &[ObjectType::Data])
            .await
            .unwrap();
        let id = headers[0].object_id;

        let result = coordinator
            .write_batch(
                "tenant-a",
                WriteBatch {
                    preallocate: vec![],
                    create_preallocated: vec![entry(id, ObjectType::Data)],
                    update_object: vec![],
                },
            )
            .await
            .unwrap();
        assert_eq!(result.created[0].object_version, 1);

        let tag = coordinator
            .read_object("tenant-a", &Selector::latest(id))
            .await
            .unwrap();
        assert_eq!(tag.attrs["definition"], serde_json::json!({"v": 1}));
    }

    #[tokio::test]
    async fn lost_update_is_rejected_as_duplicate() {
        let coordinator = MemoryCoordinator::new();
        let headers = coordinator
            .preallocate_batch("tenant-a", &[ObjectType::Data])
            .await
            .unwrap();
        let id = headers[0].object_id;
        coordinator
            .write_batch(
                "tenant-a",
                WriteBatch {
                    preallocate: vec![],
                    create_preallocated: vec![entry(id, ObjectType::Data)],
                    update_object: vec![],
                },
            )
            .await
            .unwrap();

        let stale = coordinator
            .write_batch(
                "tenant-a",
                WriteBatch {
                    preallocate: vec![],
                    create_preallocated: vec![],
                    update_object: vec![UpdateObjectEntry {
                        object_id: id,
                        object_type: ObjectType::Data,
                        prior_version: 0,
                        tag_updates: vec![],
                        definition: serde_json::json!({"v": 2}),
                    }],
                },
            )
            .await;
        assert_matches!(stale, Err(Error::Duplicate(_)));
    }

    #[tokio::test]
    async fn update_behind_history_is_version_invalid() {
        let coordinator = MemoryCoordinator::new();
        let headers = coordinator
            .preallocate_batch("tenant-a", &[ObjectType::Data])
            .await
            .unwrap();
        let id = headers[0].object_id;
        coordinator
            .write_batch(
                "tenant-a",
                WriteBatch {
                    preallocate: vec![],
                    create_preallocated: vec![entry(id, ObjectType::Data)],
                    update_object: vec![],
                },
            )
            .await
            .unwrap();
        coordinator
            .write_batch(
                "tenant-a",
                WriteBatch {
                    preallocate: vec![],
                    create_preallocated: vec![],
                    update_object: vec![UpdateObjectEntry {
                        object_id: id,
                        object_type: ObjectType::Data,
                        prior_version: 0,
                        tag_updates: vec![],
                        definition: serde_json::json!({"v": 2}),
                    }],
                },
            )
            .await
            .unwrap();

        // Now at version 2; a caller targeting a prior_version ahead of
        // the true history (it hasn't happened yet) gets VersionInvalid,
        // never Duplicate.
        let ahead = coordinator
            .write_batch(
                "tenant-a",
                WriteBatch {
                    preallocate: vec![],
                    create_preallocated: vec![],
                    update_object: vec![UpdateObjectEntry {
                        object_id: id,
                        object_type: ObjectType::Data,
                        prior_version: 5,
                        tag_updates: vec![],
                        definition: serde_json::json!({"v": 3}),
                    }],
                },
            )
            .await;
        assert_matches!(ahead, Err(Error::VersionInvalid(_)));
    }

    #[tokio::test]
    async fn save_new_tag_carries_forward_attrs() {
        let coordinator = MemoryCoordinator::new();
        let headers = coordinator
            .preallocate_batch("tenant-a", &[ObjectType::Data])
            .await
            .unwrap();
        let id = headers[0].object_id;
        coordinator
            .write_batch(
                "tenant-a",
                WriteBatch {
                    preallocate: vec![],
                    create_preallocated: vec![entry(id, ObjectType::Data)],
                    update_object: vec![],
                },
            )
            .await
            .unwrap();

        let header = coordinator
            .save_new_tag(
                "tenant-a",
                id,
                1,
                1,
                vec![TagUpdate::create("note", serde_json::json!("reviewed"))],
            )
            .await
            .unwrap();
        assert_eq!(header.tag_version, 2);

        let tag = coordinator
            .read_object("tenant-a", &Selector::latest(id))
            .await
            .unwrap();
        assert_eq!(tag.attrs["definition"], serde_json::json!({"v": 1}));
        assert_eq!(tag.attrs["note"], serde_json::json!("reviewed"));
    }

    #[tokio::test]
    async fn concurrent_tag_save_has_exactly_one_winner() {
        let coordinator = MemoryCoordinator::new();
        let headers = coordinator
            .preallocate_batch("tenant-a", &[ObjectType::Data])
            .await
            .unwrap();
        let id = headers[0].object_id;
        coordinator
            .write_batch(
                "tenant-a",
                WriteBatch {
                    preallocate: vec![],
                    create_preallocated: vec![entry(id, ObjectType::Data)],
                    update_object: vec![],
                },
            )
            .await
            .unwrap();

        coordinator
            .save_new_tag(
                "tenant-a",
                id,
                1,
                1,
                vec![TagUpdate::create("note", serde_json::json!("first"))],
            )
            .await
            .unwrap();

        // A second saver that also believed tag_version 1 was current has
        // lost the race: the chain has already moved to tag_version 2.
        let loser = coordinator
            .save_new_tag(
                "tenant-a",
                id,
                1,
                1,
                vec![TagUpdate::create("note", serde_json::json!("second"))],
            )
            .await;
        assert_matches!(loser, Err(Error::Duplicate(_)));
    }
}
