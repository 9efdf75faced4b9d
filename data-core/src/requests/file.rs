/*!
The `createFile` / `updateFile` / `readFile` pipelines.
*/

use std::sync::Arc;

use data_core_spec::{
    path::file_storage_path, Copy as StorageCopy, FileDefinition, Incarnation, ObjectHeader,
    ObjectType, Selector, StorageDefinition, StorageItem, StorageStatus, TagUpdate,
};

use crate::coordinator::{
    CreatePreallocatedEntry, MetadataCoordinator, UpdateObjectEntry, WriteBatch,
};
use crate::error::Error;
use crate::pipeline::{writer::run_write_pipeline, ByteStream, StorageBackend};
use crate::requests::context::RequestContext;
use crate::requests::dataset::prior_tag_definition;
use crate::version_guard;

pub struct CreateFileRequest {
    pub ctx: RequestContext,
    pub tag_updates: Vec<TagUpdate>,
    pub name: String,
    pub mime_type: String,
    pub declared_size: Option<u64>,
    pub storage_key: String,
    pub storage_format: String,
}

pub struct UpdateFileRequest {
    pub ctx: RequestContext,
    pub prior: Selector,
    pub tag_updates: Vec<TagUpdate>,
    pub name: String,
    pub declared_size: Option<u64>,
    pub storage_key: String,
    pub storage_format: String,
}

fn owner_tag_update(object_id: uuid::Uuid, object_version: u64) -> TagUpdate {
    TagUpdate::create(
        "owner",
        serde_json::to_value(Selector::version(object_id, object_version))
            .expect("selector serialises"),
    )
}

/// `createFile` (create pipeline, stages 3-4-7-8-9).
pub async fn create_file(
    coordinator: &dyn MetadataCoordinator,
    storage: &dyn StorageBackend,
    request: CreateFileRequest,
    inbound: ByteStream,
) -> Result<ObjectHeader, Error> {
    let CreateFileRequest {
        ctx,
        mut tag_updates,
        name,
        mime_type,
        declared_size,
        storage_key,
        storage_format,
    } = request;

    // Stage 3: pre-allocate FILE + STORAGE ids in one batched call.
    let preallocated = coordinator
        .preallocate_batch(&ctx.tenant, &[ObjectType::File, ObjectType::Storage])
        .await?;
    let file_header = preallocated
        .iter()
        .find(|h| h.object_type == ObjectType::File)
        .ok_or_else(|| Error::Internal("preallocate_batch did not return a FILE id".into()))?
        .clone();
    let storage_header = preallocated
        .iter()
        .find(|h| h.object_type == ObjectType::Storage)
        .ok_or_else(|| Error::Internal("preallocate_batch did not return a STORAGE id".into()))?
        .clone();

    // Stage 4: build definitions.
    let object_version = 1;
    let data_item = format!("{}/content", file_header.object_id);
    let extension = FileDefinition::derive_extension(&name);
    let storage_path =
        file_storage_path("FILE", &file_header.object_id, object_version, &name);

    // Stage 7: stream payload (no codec for opaque files).
    let outcome = run_write_pipeline(
        storage,
        &storage_path,
        inbound,
        None,
        declared_size,
        &ctx.cancellation,
    )
    .await?;

    let definition = FileDefinition {
        name: name.clone(),
        extension: extension.clone(),
        mime_type: mime_type.clone(),
        size: outcome.bytes_written,
        data_item: data_item.clone(),
        storage_id: Selector::latest(storage_header.object_id),
    };

    let copy = StorageCopy {
        storage_key,
        storage_path,
        storage_format,
        status: StorageStatus::Available,
        timestamp: chrono::Utc::now(),
    };
    let mut storage_definition = StorageDefinition::new();
    storage_definition.add(data_item, StorageItem::new(Incarnation::first(copy)));

    // Stage 8: finalise tags.
    tag_updates.insert(0, TagUpdate::create("size", serde_json::json!(definition.size)));
    if let Some(ext) = &extension {
        tag_updates.insert(1, TagUpdate::create("extension", serde_json::json!(ext)));
    }

    // Stage 9: commit.
    let batch = WriteBatch {
        preallocate: vec![],
        create_preallocated: vec![
            CreatePreallocatedEntry {
                object_id: file_header.object_id,
                object_type: ObjectType::File,
                tag_updates,
                definition: serde_json::to_value(&definition)?,
            },
            CreatePreallocatedEntry {
                object_id: storage_header.object_id,
                object_type: ObjectType::Storage,
                tag_updates: vec![owner_tag_update(file_header.object_id, object_version)],
                definition: serde_json::to_value(&storage_definition)?,
            },
        ],
        update_object: vec![],
    };
    let result = coordinator.write_batch(&ctx.tenant, batch).await?;
    result
        .created
        .into_iter()
        .find(|h| h.object_type == ObjectType::File)
        .ok_or_else(|| Error::Internal("write_batch did not return a FILE header".into()))
}

/// `updateFile` (update pipeline, stages 1-4-5-6-7-8-9).
pub async fn update_file(
    coordinator: &dyn MetadataCoordinator,
    storage: &dyn StorageBackend,
    request: UpdateFileRequest,
    inbound: ByteStream,
) -> Result<ObjectHeader, Error> {
    let UpdateFileRequest {
        ctx,
        prior,
        mut tag_updates,
        name,
        declared_size,
        storage_key,
        storage_format,
    } = request;

    // Stage 1: load prior FILE tag.
    let prior_tag = coordinator.read_object(&ctx.tenant, &prior).await?;
    if prior_tag.header.object_type != ObjectType::File {
        return Err(Error::WrongType("update_file selector is not a FILE object".into()));
    }
    let prior_definition: FileDefinition =
        serde_json::from_value(prior_tag_definition(&prior_tag)?)?;

    let prior_storage_tag = coordinator
        .read_object(&ctx.tenant, &prior_definition.storage_id)
        .await?;
    let prior_storage: StorageDefinition =
        serde_json::from_value(prior_tag_definition(&prior_storage_tag)?)?;

    // Stage 4: build definitions.
    let new_version = version_guard::check_version_sequence(&prior_tag.header, ObjectType::File)?;
    let data_item = format!("{}/content-v{new_version}", prior_tag.header.object_id);
    let extension = prior_definition.extension.clone();
    let storage_path = file_storage_path(
        "FILE",
        &prior_tag.header.object_id,
        new_version,
        &name,
    );

    // Stage 7: stream payload.
    let outcome = run_write_pipeline(
        storage,
        &storage_path,
        inbound,
        None,
        declared_size,
        &ctx.cancellation,
    )
    .await?;

    let new_definition = FileDefinition {
        name: name.clone(),
        extension: extension.clone(),
        mime_type: prior_definition.mime_type.clone(),
        size: outcome.bytes_written,
        data_item: data_item.clone(),
        storage_id: prior_definition.storage_id,
    };

    // Stage 5: version guard (extension/mime immutability).
    version_guard::check_file_compatible(&prior_definition, &new_definition)?;

    // Stage 6: supersession check.
    version_guard::check_not_superseded(&prior_storage, &data_item)?;

    let copy = StorageCopy {
        storage_key,
        storage_path,
        storage_format,
        status: StorageStatus::Available,
        timestamp: chrono::Utc::now(),
    };
    let mut new_storage = prior_storage.clone();
    new_storage.add(data_item, StorageItem::new(Incarnation::first(copy)));

    // Stage 8: finalise tags.
    tag_updates.insert(0, TagUpdate::create("size", serde_json::json!(new_definition.size)));

    // Stage 9: commit.
    let batch = WriteBatch {
        preallocate: vec![],
        create_preallocated: vec![],
        update_object: vec![
            UpdateObjectEntry {
                object_id: prior_tag.header.object_id,
                object_type: ObjectType::File,
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
        .find(|h| h.object_type == ObjectType::File)
        .ok_or_else(|| Error::Internal("write_batch did not return a FILE header".into()))
}

pub struct ReadFileRequest {
    pub ctx: RequestContext,
    pub selector: Selector,
    pub offset: Option<u64>,
    pub limit: Option<i64>,
}

pub struct ReadFileResult {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub stream: ByteStream,
}

/// Read pipeline for files.
pub async fn read_file(
    coordinator: &dyn MetadataCoordinator,
    storage: Arc<dyn StorageBackend>,
    request: ReadFileRequest,
) -> Result<ReadFileResult, Error> {
    let tag = coordinator.read_object(&request.ctx.tenant, &request.selector).await?;
    if tag.header.object_type != ObjectType::File {
        return Err(Error::WrongType("read_file selector is not a FILE object".into()));
    }
    let definition: FileDefinition = serde_json::from_value(prior_tag_definition(&tag)?)?;
    let storage_tag = coordinator
        .read_object(&request.ctx.tenant, &definition.storage_id)
        .await?;
    let storage_definition: StorageDefinition =
        serde_json::from_value(prior_tag_definition(&storage_tag)?)?;

    let item = storage_definition
        .data_items
        .get(&definition.data_item)
        .ok_or_else(|| Error::Missing(format!("data item {} not found in storage", definition.data_item)))?;
    let copy = item
        .latest()
        .and_then(|i| i.preferred_copy())
        .ok_or_else(|| Error::Missing("no readable copy for data item".into()))?;

    let stream = crate::pipeline::reader::run_read_pipeline(
        storage.as_ref(),
        &copy.storage_path,
        request.offset,
        request.limit,
        &request.ctx.cancellation,
    )
    .await?;

    Ok(ReadFileResult {
        name: definition.name,
        mime_type: definition.mime_type,
        size: definition.size,
        stream,
    })
}
