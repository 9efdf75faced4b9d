/*!
The metadata coordinator: the async client interface the request
state machine uses to pre-allocate ids, read prior tags, and commit the
final write batch via the catalogue collaborator.

Modelled as an object-safe `#[async_trait]` trait (mirroring the
teacher's `Catalog` trait) so production code can hold `Arc<dyn
MetadataCoordinator>` and swap a real catalogue RPC client for the
in-memory reference implementation (`data-catalog-memory`) in tests.
*/

use async_trait::async_trait;
use data_core_spec::{ObjectHeader, ObjectType, Selector, Tag, TagUpdate};

use crate::error::Error;

/// One entry of a pre-allocate request: which kind of id to mint.
#[derive(Debug, Clone)]
pub struct PreallocateRequest {
    pub object_type: ObjectType,
}

/// One entry that graduates a pre-allocated id to version 1.
#[derive(Debug, Clone)]
pub struct CreatePreallocatedEntry {
    pub object_id: uuid::Uuid,
    pub object_type: ObjectType,
    pub tag_updates: Vec<TagUpdate>,
    /// Opaque, object-type-specific definition payload (already serialised
    /// by the caller); the coordinator does not interpret it.
    pub definition: serde_json::Value,
}

/// One entry that commits a new version superseding `prior`.
#[derive(Debug, Clone)]
pub struct UpdateObjectEntry {
    pub object_id: uuid::Uuid,
    pub object_type: ObjectType,
    pub prior_version: u64,
    pub tag_updates: Vec<TagUpdate>,
    pub definition: serde_json::Value,
}

/// One batched write: either all entries commit, or none do.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub preallocate: Vec<PreallocateRequest>,
    pub create_preallocated: Vec<CreatePreallocatedEntry>,
    pub update_object: Vec<UpdateObjectEntry>,
}

/// The result of committing a [`WriteBatch`]: headers in positional
/// correspondence with `preallocate` then `create_preallocated` then
/// `update_object`.
#[derive(Debug, Clone, Default)]
pub struct WriteBatchResult {
    pub preallocated: Vec<ObjectHeader>,
    pub created: Vec<ObjectHeader>,
    pub updated: Vec<ObjectHeader>,
}

#[async_trait]
pub trait MetadataCoordinator: Send + Sync {
    /// Pre-allocate ids for the given kinds, in one batched call. Never
    /// collides with an existing id.
    async fn preallocate_batch(
        &self,
        tenant: &str,
        kinds: &[ObjectType],
    ) -> Result<Vec<ObjectHeader>, Error>;

    /// Read exactly the tag the selector names.
    async fn read_object(&self, tenant: &str, selector: &Selector) -> Result<Tag, Error>;

    /// Read a batch of tags, positionally matching `selectors`.
    async fn read_batch(&self, tenant: &str, selectors: &[Selector]) -> Result<Vec<Tag>, Error>;

    /// Commit a write batch atomically: all entries commit, or none do.
    /// MUST NOT be retried by the coordinator: a retried commit would
    /// violate the contiguous-version invariant if the first attempt
    /// actually succeeded.
    async fn write_batch(
        &self,
        tenant: &str,
        batch: WriteBatch,
    ) -> Result<WriteBatchResult, Error>;

    /// Save a new tag on an already-committed object version.
    /// `expected_prior_tag_version` must match the live tag chain's current
    /// `tag_version`; a mismatch means a concurrent saver already won the
    /// race and is reported as `Duplicate`, the same way a lost object
    /// update is. Saving a tag on an object version that has not yet been
    /// committed fails `Missing`, even for an expected prior version of 0.
    async fn save_new_tag(
        &self,
        tenant: &str,
        object_id: uuid::Uuid,
        object_version: u64,
        expected_prior_tag_version: u64,
        tag_updates: Vec<TagUpdate>,
    ) -> Result<ObjectHeader, Error>;
}
