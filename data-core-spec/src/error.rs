/*!
Error type for the data model.
*/

use thiserror::Error;

#[derive(Error, Debug)]
/// Errors raised while building or validating data-model values.
///
/// This is the low-level error type for `data-core-spec`; the request
/// pipeline crate (`data-core`) wraps it in its own error together with
/// the wire-facing error kinds of the service.
pub enum Error {
    /// A value did not have the expected shape.
    #[error("{0} doesn't have the right format")]
    InvalidFormat(String),
    /// A referenced entity was not found.
    #[error("{0} {1} not found")]
    NotFound(String, String),
    /// An operation is not supported in this context.
    #[error("feature {0} is not supported")]
    NotSupported(String),
    /// Schema compatibility was violated.
    #[error("schema incompatible: {0}")]
    SchemaIncompatible(String),
    /// Serde json error.
    #[error("serde json error")]
    JSONSerde(#[from] serde_json::Error),
    /// Uuid error.
    #[error("uuid error")]
    Uuid(#[from] uuid::Error),
    /// Chrono parse error.
    #[error("chrono parse error")]
    Chrono(#[from] chrono::ParseError),
}
