/*!
Data model for the data-plane of the model-execution platform: object
headers, tags, selectors, schemas, and the file/data/storage
definitions that the request pipeline in `data-core` builds and the
metadata catalogue persists.

This crate owns no I/O; it is the plain-value layer both `data-core`
and the catalogue collaborator agree on.
*/

pub mod definitions;
pub mod error;
pub mod header;
pub mod path;
pub mod schema;
pub mod selector;
pub mod storage;
pub mod tag;

pub use definitions::{DataDefinition, Delta, FileDefinition, Part, SchemaRef, Snap};
pub use error::Error;
pub use header::{ObjectHeader, ObjectType};
pub use schema::{Field, FieldType, Schema};
pub use selector::{Selector, TagSelector, VersionSelector};
pub use storage::{Copy, Incarnation, StorageDefinition, StorageItem, StorageStatus};
pub use tag::{Tag, TagUpdate, TagUpdateOp};
