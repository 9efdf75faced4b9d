/*!
A [`StorageBackend`] over the local filesystem, built on
`object_store::local::LocalFileSystem`. Meant for tests and for
running the service locally; a production deployment is expected to
bring its own `object_store`-backed backend for S3/GCS instead.
*/

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use data_core::error::Error;
use data_core::pipeline::{ByteStream, StorageBackend, StorageStat, StorageWriter};
use data_core::tenant::StorageBackendFactory;
use futures::StreamExt;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{GetOptions, GetRange, ObjectStore, PutPayload};

fn to_object_path(path: &str) -> ObjectPath {
    ObjectPath::from(path.trim_start_matches('/'))
}

fn map_err(err: object_store::Error) -> Error {
    Error::StorageFault(err.to_string())
}

/// A `StorageBackend` rooted at one directory on the local filesystem.
pub struct LocalStorageBackend {
    root: PathBuf,
    store: Arc<LocalFileSystem>,
}

impl LocalStorageBackend {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(Error::Io)?;
        let store = LocalFileSystem::new_with_prefix(&root).map_err(map_err)?;
        Ok(LocalStorageBackend {
            root,
            store: Arc::new(store),
        })
    }

    fn fs_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

struct LocalStorageWriter {
    upload: Box<dyn object_store::MultipartUpload>,
    written: u64,
}

#[async_trait]
impl StorageWriter for LocalStorageWriter {
    async fn write(&mut self, chunk: Bytes) -> Result<(), Error> {
        self.written += chunk.len() as u64;
        self.upload
            .put_part(PutPayload::from_bytes(chunk))
            .await
            .map_err(map_err)
    }

    async fn finish(mut self: Box<Self>) -> Result<u64, Error> {
        self.upload.complete().await.map_err(map_err)?;
        Ok(self.written)
    }
}

#[async_trait]
impl StorageBackend for LocalStorageBackend {
    async fn exists(&self, path: &str) -> Result<bool, Error> {
        match self.store.head(&to_object_path(path)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(err) => Err(map_err(err)),
        }
    }

    async fn size(&self, path: &str) -> Result<u64, Error> {
        let meta = self.store.head(&to_object_path(path)).await.map_err(map_err)?;
        Ok(meta.size as u64)
    }

    async fn stat(&self, path: &str) -> Result<StorageStat, Error> {
        let meta = self.store.head(&to_object_path(path)).await.map_err(map_err)?;
        Ok(StorageStat {
            path: path.to_string(),
            size: meta.size as u64,
            last_modified: meta.last_modified,
        })
    }

    async fn ls(&self, path: &str) -> Result<Vec<String>, Error> {
        let prefix = to_object_path(path);
        let mut entries = self.store.list(Some(&prefix));
        let mut names = Vec::new();
        while let Some(meta) = entries.next().await {
            names.push(meta.map_err(map_err)?.location.to_string());
        }
        Ok(names)
    }

    async fn mkdir(&self, path: &str, recursive: bool) -> Result<(), Error> {
        let target = self.fs_path(path);
        if recursive {
            std::fs::create_dir_all(&target).map_err(Error::Io)?;
        } else if let Some(parent) = FsPath::new(&target).parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }
        Ok(())
    }

    async fn writer(&self, path: &str) -> Result<Box<dyn StorageWriter>, Error> {
        if let Some(parent) = FsPath::new(path).parent().and_then(|p| p.to_str()) {
            if !parent.is_empty() {
                self.mkdir(parent, true).await?;
            }
        }
        let upload = self
            .store
            .put_multipart(&to_object_path(path))
            .await
            .map_err(map_err)?;
        Ok(Box::new(LocalStorageWriter { upload, written: 0 }))
    }

    async fn reader(
        &self,
        path: &str,
        offset: Option<u64>,
        limit: Option<i64>,
    ) -> Result<ByteStream, Error> {
        let object_path = to_object_path(path);
        let range = match (offset, limit) {
            (None, None) => None,
            (offset, limit) => {
                let start = offset.unwrap_or(0) as usize;
                let end = match limit {
                    Some(limit) if limit >= 0 => Some(start + limit as usize),
                    _ => None,
                };
                Some(match end {
                    Some(end) => GetRange::Bounded(start..end),
                    None => GetRange::Offset(start),
                })
            }
        };
        let result = self
            .store
            .get_opts(
                &object_path,
                GetOptions {
                    range,
                    ..Default::default()
                },
            )
            .await
            .map_err(map_err)?;
        let stream = result.into_stream().map(|item| item.map_err(map_err));
        Ok(Box::pin(stream))
    }
}

/// A [`StorageBackendFactory`] that treats the `backend` string of a
/// dynamic `trac_resources` entry as a local filesystem root directory,
/// the same interpretation the static bootstrap config uses.
#[derive(Debug, Default)]
pub struct LocalStorageBackendFactory;

#[async_trait]
impl StorageBackendFactory for LocalStorageBackendFactory {
    async fn build(&self, backend: &str) -> Result<Arc<dyn StorageBackend>, Error> {
        Ok(Arc::new(LocalStorageBackend::new(backend)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let backend = LocalStorageBackend::new(dir.path()).unwrap();

        let mut writer = backend.writer("a/b/c.csv").await.unwrap();
        writer.write(Bytes::from_static(b"id,name\n1,ada\n")).await.unwrap();
        let written = writer.finish().await.unwrap();
        assert_eq!(written, 14);

        assert!(backend.exists("a/b/c.csv").await.unwrap());
        assert_eq!(backend.size("a/b/c.csv").await.unwrap(), 14);

        let mut stream = backend.reader("a/b/c.csv", None, None).await.unwrap();
        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(buffer, b"id,name\n1,ada\n");
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let dir = tempdir().unwrap();
        let backend = LocalStorageBackend::new(dir.path()).unwrap();
        assert!(!backend.exists("nope.csv").await.unwrap());
    }
}
