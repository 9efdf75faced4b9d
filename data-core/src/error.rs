/*!
The request-pipeline error type: the typed error kinds the data plane
recognises, together with their wire category.

Every stage in `requests` and `pipeline` returns `Result<_, Error>`; the
driver never recovers an error it did not raise itself, it only adds
context while propagating (`Error::with_context`).
*/

use thiserror::Error;

/// The typed error kinds the core recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputInvalid,
    Missing,
    Duplicate,
    WrongType,
    VersionInvalid,
    DataSize,
    StorageFault,
    TenantNotFound,
    AuthDenied,
    Internal,
    Cancelled,
}

/// The wire category an [`ErrorKind`] maps to, for a transport to translate
/// into its own status codes (e.g. gRPC status or HTTP status).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireCategory {
    InvalidArgument,
    NotFound,
    AlreadyExists,
    FailedPrecondition,
    DataLoss,
    PermissionDenied,
    Internal,
    Cancelled,
}

impl ErrorKind {
    pub fn wire_category(self) -> WireCategory {
        match self {
            ErrorKind::InputInvalid => WireCategory::InvalidArgument,
            ErrorKind::Missing => WireCategory::NotFound,
            ErrorKind::Duplicate => WireCategory::AlreadyExists,
            ErrorKind::WrongType => WireCategory::FailedPrecondition,
            ErrorKind::VersionInvalid => WireCategory::FailedPrecondition,
            ErrorKind::DataSize => WireCategory::InvalidArgument,
            ErrorKind::StorageFault => WireCategory::DataLoss,
            ErrorKind::TenantNotFound => WireCategory::NotFound,
            ErrorKind::AuthDenied => WireCategory::PermissionDenied,
            ErrorKind::Internal => WireCategory::Internal,
            ErrorKind::Cancelled => WireCategory::Cancelled,
        }
    }
}

/// The request-pipeline error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InputInvalid(String),
    #[error("not found: {0}")]
    Missing(String),
    #[error("duplicate: {0}")]
    Duplicate(String),
    #[error("wrong object type: {0}")]
    WrongType(String),
    #[error("version invalid: {0}")]
    VersionInvalid(String),
    #[error("declared size {declared} does not match received size {received}")]
    DataSize { declared: u64, received: u64 },
    #[error("storage fault: {0}")]
    StorageFault(String),
    #[error("unknown tenant: {0}")]
    TenantNotFound(String),
    #[error("access denied: {0}")]
    AuthDenied(String),
    #[error("internal error")]
    Internal(String),
    #[error("cancelled")]
    Cancelled,

    #[error("data model error")]
    Spec(#[from] data_core_spec::Error),
    #[error("io error")]
    Io(#[from] std::io::Error),
    #[error("serde json error")]
    JSONSerde(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InputInvalid(_) => ErrorKind::InputInvalid,
            Error::Missing(_) => ErrorKind::Missing,
            Error::Duplicate(_) => ErrorKind::Duplicate,
            Error::WrongType(_) => ErrorKind::WrongType,
            Error::VersionInvalid(_) => ErrorKind::VersionInvalid,
            Error::DataSize { .. } => ErrorKind::DataSize,
            Error::StorageFault(_) => ErrorKind::StorageFault,
            Error::TenantNotFound(_) => ErrorKind::TenantNotFound,
            Error::AuthDenied(_) => ErrorKind::AuthDenied,
            Error::Internal(_) => ErrorKind::Internal,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Spec(_) => ErrorKind::InputInvalid,
            Error::Io(_) => ErrorKind::StorageFault,
            Error::JSONSerde(_) => ErrorKind::InputInvalid,
        }
    }

    /// Mask an uncategorised error for the wire: log the detailed cause at
    /// the adapter boundary, then return only `Error::Internal` with no
    /// description attached.
    pub fn masked_internal(cause: &(dyn std::error::Error + 'static)) -> Self {
        tracing::error!(error = %cause, "uncategorised error, masking for wire");
        Error::Internal(String::new())
    }
}
