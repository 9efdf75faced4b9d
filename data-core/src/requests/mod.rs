/*!
The request state machine: per-kind create/update/read
pipelines built from the shared [`context::RequestContext`] plus the
coordinator, storage, and codec collaborators.
*/

pub mod context;
pub mod dataset;
pub mod file;

pub use context::RequestContext;
pub use dataset::{
    CreateDatasetRequest, ReadDatasetRequest, ReadDatasetResult, SchemaInput, UpdateDatasetRequest,
};
pub use file::{CreateFileRequest, ReadFileRequest, ReadFileResult, UpdateFileRequest};
