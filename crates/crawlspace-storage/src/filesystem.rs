//! Local filesystem backend.
//!
//! Buckets are directories under a root and object keys are paths below
//! them: object `a/b.txt` in bucket `data` lives at `<root>/data/a/b.txt`.
//! Used for development and tests.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use bytes::BytesMut;
use chrono::{DateTime, Utc};
use crawlspace_core::ObjectLocation;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::backend::StorageBackend;
use crate::error::{FetchError, FetchResult};
use crate::object::{ObjectMetadata, ObjectStream, StoredObject};

/// Size of each chunk read from disk.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Serves objects from a directory tree.
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    root: PathBuf,
    chunk_size: usize,
}

impl FilesystemBackend {
    /// Create a backend rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the read chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Map a location to a path, refusing anything but plain names.
    fn object_path(&self, location: &ObjectLocation) -> FetchResult<PathBuf> {
        let mut path = self.root.clone();
        for part in std::iter::once(location.bucket.as_str()).chain(location.key.split('/')) {
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(name)), None) => path.push(name),
                _ => return Err(FetchError::NotFound),
            }
        }
        Ok(path)
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn fetch(&self, location: &ObjectLocation) -> FetchResult<StoredObject> {
        let path = self.object_path(location)?;
        debug!(%location, path = %path.display(), "opening object file");

        let file = File::open(&path).await.map_err(io_to_error)?;
        let meta = file.metadata().await.map_err(io_to_error)?;
        if !meta.is_file() {
            return Err(FetchError::NotFound);
        }

        let chunk_size = self.chunk_size;
        let body = futures::stream::try_unfold(file, move |mut file| async move {
            let mut buf = BytesMut::with_capacity(chunk_size);
            let n = file.read_buf(&mut buf).await?;
            if n == 0 {
                Ok(None)
            } else {
                Ok(Some((buf.freeze(), file)))
            }
        });

        Ok(StoredObject {
            metadata: file_metadata(&meta),
            body: ObjectStream::new(body),
        })
    }

    async fn stat(&self, location: &ObjectLocation) -> FetchResult<ObjectMetadata> {
        let path = self.object_path(location)?;
        let meta = tokio::fs::metadata(&path).await.map_err(io_to_error)?;
        if !meta.is_file() {
            return Err(FetchError::NotFound);
        }
        Ok(file_metadata(&meta))
    }
}

fn io_to_error(err: io::Error) -> FetchError {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => FetchError::NotFound,
        io::ErrorKind::PermissionDenied => FetchError::AccessDenied,
        _ => FetchError::backend(err),
    }
}

/// Metadata with an etag built from modification time and size.
fn file_metadata(meta: &std::fs::Metadata) -> ObjectMetadata {
    let modified = meta.modified().ok();
    let mtime_micros = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_micros());
    ObjectMetadata {
        content_type: None,
        content_length: Some(meta.len()),
        etag: Some(format!("{mtime_micros:x}-{:x}", meta.len())),
        last_modified: modified.map(DateTime::<Utc>::from),
    }
}
