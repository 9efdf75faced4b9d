/*!
The operational crate of the data plane: the request state machine,
the metadata coordinator client contract, the version & concurrency
guard, the streaming storage pipeline, the tenant runtime registry,
and the download/upload adapters.

`data-core-spec` carries the wire-shaped types (headers, tags,
definitions, selectors); this crate carries the behaviour built on top
of them, plus its own operational [`error::Error`].
*/

pub mod adapters;
pub mod coordinator;
pub mod error;
pub mod orphan;
pub mod pipeline;
pub mod requests;
pub mod tenant;
pub mod version_guard;

pub use coordinator::{
    CreatePreallocatedEntry, MetadataCoordinator, PreallocateRequest, UpdateObjectEntry,
    WriteBatch, WriteBatchResult,
};
pub use error::{Error, ErrorKind, WireCategory};
pub use orphan::OrphanCollector;
pub use pipeline::{ByteStream, Codec, StorageBackend, StorageWriter};
pub use requests::RequestContext;
pub use tenant::{ConfigEntry, ConfigUpdate, ConfigUpdateKind, TenantRegistry, TenantRuntime};
