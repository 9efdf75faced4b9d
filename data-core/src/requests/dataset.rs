/*!
The `createDataset` / `updateDataset` / `readDataset` pipelines.
*/

use std::sync::Arc;

use data_core_spec::{
    path::data_storage_path, Copy as StorageCopy, DataDefinition, Delta, Incarnation, ObjectHeader,
    ObjectType, Part, Schema, SchemaRef, Selector, Snap, StorageDefinition, StorageItem,
    StorageStatus, Tag, TagUpdate,
};

use crate::coordinator::{
    CreatePreallocatedEntry, MetadataCoordinator, UpdateObjectEntry, WriteBatch,
};
use crate::error::Error;
use crate::pipeline::{writer::run_write_pipeline, ByteStream, Codec, StorageBackend};
use crate::requests::context::RequestContext;
use crate::version_guard;

/// Where the request's schema comes from.
#[derive(Debug, Clone)]
pub enum SchemaInput {
    Literal(Schema),
    ById(uuid::Uuid),
}

/// Inputs to `create_dataset`.
pub struct CreateDatasetRequest {
    pub ctx: RequestContext,
    pub tag_updates: Vec<TagUpdate>,
    pub format: String,
    pub schema: SchemaInput,
    pub part_key: String,
    pub storage_key: String,
    pub declared_size: Option<u64>,
}

/// Inputs to `update_dataset`.
pub struct UpdateDatasetRequest {
    pub ctx: RequestContext,
    pub prior: Selector,
    pub tag_updates: Vec<TagUpdate>,
    pub format: String,
    pub schema: SchemaInput,
    pub part_key: String,
    pub storage_key: String,
    pub declared_size: Option<u64>,
}

async fn resolve_schema(
    coordinator: &dyn MetadataCoordinator,
    tenant: &str,
    input: &SchemaInput,
    prior_schema_ref: Option<&SchemaRef>,
) -> Result<SchemaRef, Error> {
    match input {
        SchemaInput::Literal(schema) => Ok(SchemaRef::Embedded(schema.clone())),
        SchemaInput::ById(id) => {
            // One less round-trip if the update reuses the prior's schema id.
            if let Some(SchemaRef::External(prior_selector)) = prior_schema_ref {
                if prior_selector.object_id == *id {
                    return Ok(SchemaRef::External(prior_selector.clone()));
                }
            }
            let selector = Selector::latest(*id);
            let tag = coordinator.read_object(tenant, &selector).await?;
            if tag.header.object_type != ObjectType::Schema {
                return Err(Error::WrongType(format!(
                    "{id} is not a schema object"
                )));
            }
            Ok(SchemaRef::External(selector))
        }
    }
}

fn schema_value(schema_ref: &SchemaRef, cached: Option<&Schema>) -> Result<Schema, Error> {
    match (schema_ref, cached) {
        (SchemaRef::Embedded(schema), _) => Ok(schema.clone()),
        (SchemaRef::External(_), Some(schema)) => Ok(schema.clone()),
        (SchemaRef::External(selector), None) => Err(Error::InputInvalid(format!(
            "schema object {} was not resolved before use",
            selector.object_id
        ))),
    }
}

fn build_storage_copy(storage_key: &str, format: &str, storage_path: String) -> StorageCopy {
    StorageCopy {
        storage_key: storage_key.to_string(),
        storage_path,
        storage_format: format.to_string(),
        status: StorageStatus::Available,
        timestamp: chrono::Utc::now(),
    }
}

fn owner_tag_update(object_id: uuid::Uuid, object_version: u64) -> TagUpdate {
    TagUpdate::create(
        "owner",
        serde_json::to_value(Selector::version(object_id, object_version))
            .expect("selector serialises"),
    )
}

/// `createDataset` (create pipeline, stages 2-3-4-7-8-9).
pub async fn create_dataset(
    coordinator: &dyn MetadataCoordinator,
    storage: &dyn StorageBackend,
    codec: &dyn Codec,
    request: CreateDatasetRequest,
    inbound: ByteStream,
) -> Result<ObjectHeader, Error> {
    let CreateDatasetRequest {
        ctx,
        mut tag_updates,
        format,
        schema,
        part_key,
        storage_key,
        declared_size,
    } = request;

    // Stage 2: resolve schema.
    let schema_ref = resolve_schema(coordinator, &ctx.tenant, &schema, None).await?;
    let resolved_schema = schema_value(&schema_ref, match &schema {
        SchemaInput::Literal(s) => Some(s),
        SchemaInput::ById(_) => None,
    })?;

    // Stage 3: pre-allocate DATA + STORAGE ids in one batched call.
    let preallocated = coordinator
        .preallocate_batch(&ctx.tenant, &[ObjectType::Data, ObjectType::Storage])
        .await?;
    let data_header = preallocated
        .iter()
        .find(|h| h.object_type == ObjectType::Data)
        .ok_or_else(|| Error::Internal("preallocate_batch did not return a DATA id".into()))?
        .clone();
    let storage_header = preallocated
        .iter()
        .find(|h| h.object_type == ObjectType::Storage)
        .ok_or_else(|| Error::Internal("preallocate_batch did not return a STORAGE id".into()))?
        .clone();

    // Stage 4: build definitions. object_version = 1 on create.
    let object_version = 1;
    let data_item = format!("{}/{part_key}/snap-0/delta-0", data_header.object_id);
    let extension = (format == "application/json").then(|| "json".to_string());
    let storage_path = data_storage_path(
        "DATA",
        &data_header.object_id,
        &part_key,
        0,
        0,
        extension.as_deref(),
    );

    // Stage 7: stream payload.
    let outcome = run_write_pipeline(
        storage,
        &storage_path,
        inbound,
        Some((codec, &resolved_schema)),
        declared_size,
        &ctx.cancellation,
    )
    .await?;
    let row_count = outcome.row_count.unwrap_or(0);

    let delta = Delta {
        delta_index: 0,
        data_item: data_item.clone(),
        physical_row_count: row_count,
        delta_row_count: row_count,
    };
    let mut data_definition = DataDefinition {
        schema_ref,
        parts: Default::default(),
        row_count: 0,
        storage_id: Selector::latest(storage_header.object_id),
    };
    data_definition
        .parts
        .insert(part_key.clone(), Part { snap: Snap::first(delta) });
    data_definition.recompute_row_count();

    let copy = build_storage_copy(&storage_key, &format, storage_path);
    let mut storage_definition = StorageDefinition::new();
    storage_definition.add(data_item, StorageItem::new(Incarnation::first(copy)));

    // Stage 8: finalise tags.
    tag_updates.insert(
        0,
        TagUpdate::create("row_count", serde_json::json!(row_count)),
    );

    // Stage 9: commit.
    let batch = WriteBatch {
        preallocate: vec![],
        create_preallocated: vec![
            CreatePreallocatedEntry {
                object_id: data_header.object_id,
                object_type: ObjectType::Data,
                tag_updates,
                definition: serde_json::to_value(&data_definition)?,
            },
            CreatePreallocatedEntry {
                object_id: storage_header.object_id,
                object_type: ObjectType::Storage,
                tag_updates: vec![owner_tag_update(data_header.object_id, object_version)],
                definition: serde_json::to_value(&storage_definition)?,
            },
        ],
        update_object: vec![],
    };
    let result = coordinator.write_batch(&ctx.tenant, batch).await?;
    result
        .created
        .into_iter()
        .find(|h| h.object_type == ObjectType::Data)
        .ok_or_else(|| Error::Internal("write_batch did not return a DATA header".into()))
}

/// `updateDataset` (update pipeline, stages 1-2-4-5-6-7-8-9).
pub async fn update_dataset(
    coordinator: &dyn MetadataCoordinator,
    storage: &dyn StorageBackend,
    codec: &dyn Codec,
    request: UpdateDatasetRequest,
    inbound: ByteStream,
) -> Result<ObjectHeader, Error> {
    let UpdateDatasetRequest {
        ctx,
        prior,
        mut tag_updates,
        format,
        schema,
        part_key,
        storage_key,
        declared_size,
    } = request;

    // Stage 1: load prior DATA tag.
    let prior_tag = coordinator.read_object(&ctx.tenant, &prior).await?;
    if prior_tag.header.object_type != ObjectType::Data {
        return Err(Error::WrongType("update_dataset selector is not a DATA object".into()));
    }
    let prior_definition: DataDefinition =
        serde_json::from_value(prior_tag_definition(&prior_tag)?)?;

    // Load prior STORAGE tag.
    let prior_storage_tag = coordinator
        .read_object(&ctx.tenant, &prior_definition.storage_id)
        .await?;
    let prior_storage: StorageDefinition =
        serde_json::from_value(prior_tag_definition(&prior_storage_tag)?)?;

    // Stage 2: resolve schema, reusing the prior's external schema id if unchanged.
    let schema_ref = resolve_schema(
        coordinator,
        &ctx.tenant,
        &schema,
        Some(&prior_definition.schema_ref),
    )
    .await?;
    let cached_prior_schema = match &prior_definition.schema_ref {
        SchemaRef::Embedded(schema) => Some(schema),
        SchemaRef::External(_) => None,
    };
    let resolved_schema = schema_value(
        &schema_ref,
        match &schema {
            SchemaInput::Literal(s) => Some(s),
            SchemaInput::ById(_) => cached_prior_schema,
        },
    )?;

    // Stage 4: build definitions.
    let new_version = version_guard::check_version_sequence(&prior_tag.header, ObjectType::Data)?;
    let prior_snap_index = prior_definition
        .parts
        .get(&part_key)
        .map(|p| p.snap.snap_index)
        .unwrap_or(0);
    let snap_index = prior_snap_index + 1;
    let data_item = format!(
        "{}/{part_key}/snap-{snap_index}/delta-0",
        prior_tag.header.object_id
    );
    let extension = (format == "application/json").then(|| "json".to_string());
    let storage_path = data_storage_path(
        "DATA",
        &prior_tag.header.object_id,
        &part_key,
        snap_index,
        0,
        extension.as_deref(),
    );

    // Stage 5: version guard (schema compatibility).
    let prior_schema = schema_value(&prior_definition.schema_ref, cached_prior_schema)?;
    if let Err(reason) = version_guard::check_schema_compatible(&prior_schema, &resolved_schema) {
        return Err(Error::VersionInvalid(reason.to_string()));
    }

    // Stage 6: supersession check.
    version_guard::check_not_superseded(&prior_storage, &data_item)?;

    // Stage 7: stream payload.
    let outcome = run_write_pipeline(
        storage,
        &storage_path,
        inbound,
        Some((codec, &resolved_schema)),
        declared_size,
        &ctx.cancellation,
    )
    .await?;
    let row_count = outcome.row_count.unwrap_or(0);

    let delta = Delta {
        delta_index: 0,
        data_item: data_item.clone(),
        physical_row_count: row_count,
        delta_row_count: row_count,
    };
    let mut new_definition = prior_definition.clone();
    new_definition.schema_ref = schema_ref;
    new_definition.parts.insert(
        part_key.clone(),
        Part {
            snap: Snap {
                snap_index,
                deltas: vec![delta],
            },
        },
    );
    new_definition.recompute_row_count();

    let copy = build_storage_copy(&storage_key, &format, storage_path);
    let mut new_storage = prior_storage.clone();
    new_storage.add(data_item, StorageItem::new(Incarnation::first(copy)));

    // Stage 8: finalise tags.
    tag_updates.insert(
        0,
        TagUpdate::create("row_count", serde_json::json!(row_count)),
    );

    // Stage 9: commit.
    let batch = WriteBatch {
        preallocate: vec![],
        create_preallocated: vec![],
        update_object: vec![
            UpdateObjectEntry {
                object_id: prior_tag.header.object_id,
                object_type: ObjectType::Data,
                prior_version: prior_tag.header.object_version,
                tag_updates,
                definition: serde_json::to_value(&new_definition)?,
            },
            UpdateObjectEntry {
                object_id: prior_storage_tag.header.object_id,
                object_type: ObjectType::Storage,
                prior_version: prior_storage_tag.header.object_version,
                tag_updates: vec![],
                definition: serde_json::to_value(&new_storage)?,
            },
        ],
    };
    let result = coordinator.write_batch(&ctx.tenant, batch).await?;
    result
        .updated
        .into_iter()
        .find(|h| h.object_type == ObjectType::Data)
        .ok_or_else(|| Error::Internal("write_batch did not return a DATA header".into()))
}

/// Helper: a tag's `definition` attribute, as committed by `write_batch`.
pub(crate) fn prior_tag_definition(tag: &Tag) -> Result<serde_json::Value, Error> {
    tag.attrs
        .get("definition")
        .cloned()
        .ok_or_else(|| Error::Missing(format!("{} has no definition attribute", tag.header.object_id)))
}

/// Read pipeline for datasets.
pub struct ReadDatasetRequest {
    pub ctx: RequestContext,
    pub selector: Selector,
    pub part_key: String,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

pub struct ReadDatasetResult {
    pub schema: Schema,
    pub row_count: u64,
    pub stream: ByteStream,
}

pub async fn read_dataset(
    coordinator: &dyn MetadataCoordinator,
    storage: Arc<dyn StorageBackend>,
    request: ReadDatasetRequest,
) -> Result<ReadDatasetResult, Error> {
    let tag = coordinator.read_object(&request.ctx.tenant, &request.selector).await?;
    if tag.header.object_type != ObjectType::Data {
        return Err(Error::WrongType("read_dataset selector is not a DATA object".into()));
    }
    let definition: DataDefinition = serde_json::from_value(prior_tag_definition(&tag)?)?;
    let storage_tag = coordinator
        .read_object(&request.ctx.tenant, &definition.storage_id)
        .await?;
    let storage_definition: StorageDefinition =
        serde_json::from_value(prior_tag_definition(&storage_tag)?)?;

    let part = definition
        .parts
        .get(&request.part_key)
        .ok_or_else(|| Error::Missing(format!("part {} not found", request.part_key)))?;
    let delta = part
        .snap
        .deltas
        .last()
        .ok_or_else(|| Error::Missing("part has no deltas".into()))?;
    let item = storage_definition
        .data_items
        .get(&delta.data_item)
        .ok_or_else(|| Error::Missing(format!("data item {} not found in storage", delta.data_item)))?;
    let copy = item
        .latest()
        .and_then(|i| i.preferred_copy())
        .ok_or_else(|| Error::Missing("no readable copy for data item".into()))?;

    let schema = schema_value(&definition.schema_ref, match &definition.schema_ref {
        SchemaRef::Embedded(s) => Some(s),
        SchemaRef::External(_) => None,
    })?;

    let stream = crate::pipeline::reader::run_read_pipeline(
        storage.as_ref(),
        &copy.storage_path,
        request.offset,
        request.limit,
        &request.ctx.cancellation,
    )
    .await?;

    Ok(ReadDatasetResult {
        schema,
        row_count: definition.row_count,
        stream,
    })
}
