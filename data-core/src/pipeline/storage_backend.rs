/*!
The object-store backend capability set: `exists`, `size`, `stat`,
`ls`, `mkdir`, `reader`, `writer`. All operations are asynchronous and
respect the calling driver's cancellation token.
*/

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::pipeline::ByteStream;

/// Metadata about one stored object, as returned by `stat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStat {
    pub path: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// An open, exclusive writer for one storage path. Chunks are forwarded
/// in the order they are written; `finish` signals the caller with the
/// total number of bytes written.
#[async_trait]
pub trait StorageWriter: Send {
    async fn write(&mut self, chunk: Bytes) -> Result<(), Error>;
    async fn finish(self: Box<Self>) -> Result<u64, Error>;
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, Error>;
    async fn size(&self, path: &str) -> Result<u64, Error>;
    async fn stat(&self, path: &str) -> Result<StorageStat, Error>;
    async fn ls(&self, path: &str) -> Result<Vec<String>, Error>;
    /// Create the directory at `path`; `recursive` mirrors `mkdir -p`.
    async fn mkdir(&self, path: &str, recursive: bool) -> Result<(), Error>;
    /// Open an exclusive writer for `path`, creating parent directories
    /// first.
    async fn writer(&self, path: &str) -> Result<Box<dyn StorageWriter>, Error>;
    /// Open a reader for `path`. `offset`/`limit` are byte-skip/byte-limit
    /// for files; a negative `limit` means unbounded.
    async fn reader(
        &self,
        path: &str,
        offset: Option<u64>,
        limit: Option<i64>,
    ) -> Result<ByteStream, Error>;

    /// Release any resources held for this tenant's storage manager.
    /// Failures are logged and swallowed by the tenant registry so that
    /// one bad backend does not block shutdown of the others.
    async fn shutdown(&self) -> Result<(), Error> {
        Ok(())
    }
}
