//! In-memory storage backend.
//!
//! Objects are registered up front and never change afterwards, so reads need
//! no locking. Every body handed out by [`MemoryBackend::fetch`] is counted
//! while it is alive, which lets tests assert that the HTTP layer releases
//! streams on every exit path.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use crawlspace_core::ObjectLocation;
use futures::StreamExt;
use md5::{Digest, Md5};

use crate::backend::StorageBackend;
use crate::error::{FetchError, FetchResult};
use crate::object::{ObjectMetadata, ObjectStream, StoredObject};

/// Chunk size used when streaming registered objects.
const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Filler for endless objects.
static ENDLESS_CHUNK: [u8; 8192] = [b'x'; 8192];

#[derive(Debug, Clone)]
enum Entry {
    Object {
        data: Bytes,
        metadata: ObjectMetadata,
    },
    Endless {
        metadata: ObjectMetadata,
    },
    Failure(FetchError),
}

/// Fixed set of objects served from memory.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    entries: HashMap<(String, String), Entry>,
    chunk_size: usize,
    live_streams: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            live_streams: Arc::new(AtomicUsize::new(0)),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Override the chunk size of streamed bodies.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Register an object. The etag is derived from the content.
    #[must_use]
    pub fn with_object(self, bucket: &str, key: &str, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let metadata = ObjectMetadata {
            content_type: None,
            content_length: Some(data.len() as u64),
            etag: Some(content_etag(&data)),
            last_modified: None,
        };
        self.with_object_metadata(bucket, key, data, metadata)
    }

    /// Register an object with explicit metadata.
    #[must_use]
    pub fn with_object_metadata(
        mut self,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        metadata: ObjectMetadata,
    ) -> Self {
        self.entries.insert(
            (bucket.to_owned(), key.to_owned()),
            Entry::Object {
                data: data.into(),
                metadata,
            },
        );
        self
    }

    /// Register an object whose body never ends.
    #[must_use]
    pub fn with_endless_object(mut self, bucket: &str, key: &str) -> Self {
        let metadata = ObjectMetadata {
            content_type: Some("application/octet-stream".to_owned()),
            content_length: None,
            etag: Some("endless".to_owned()),
            last_modified: None,
        };
        self.entries.insert(
            (bucket.to_owned(), key.to_owned()),
            Entry::Endless { metadata },
        );
        self
    }

    /// Make reads of one location fail.
    #[must_use]
    pub fn with_failure(mut self, bucket: &str, key: &str, error: FetchError) -> Self {
        self.entries
            .insert((bucket.to_owned(), key.to_owned()), Entry::Failure(error));
        self
    }

    /// Number of bodies handed out and not yet dropped.
    #[must_use]
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    /// Number of `fetch` and `stat` calls served so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn entry(&self, location: &ObjectLocation) -> FetchResult<&Entry> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .entries
            .get(&(location.bucket.clone(), location.key.clone()))
            .ok_or(FetchError::NotFound)?;
        match entry {
            Entry::Failure(err) => Err(err.clone()),
            other => Ok(other),
        }
    }

    fn tracked(&self, stream: ObjectStream) -> ObjectStream {
        let guard = LiveStream::acquire(Arc::clone(&self.live_streams));
        ObjectStream::new(stream.map(move |chunk| {
            let _alive = &guard;
            chunk
        }))
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn fetch(&self, location: &ObjectLocation) -> FetchResult<StoredObject> {
        let (metadata, body) = match self.entry(location)? {
            Entry::Object { data, metadata } => {
                let chunks: Vec<_> = data
                    .chunks(self.chunk_size)
                    .map(|c| Ok(data.slice_ref(c)))
                    .collect();
                (metadata.clone(), ObjectStream::new(futures::stream::iter(chunks)))
            }
            Entry::Endless { metadata } => {
                let body = futures::stream::repeat_with(|| Ok(Bytes::from_static(&ENDLESS_CHUNK)));
                (metadata.clone(), ObjectStream::new(body))
            }
            Entry::Failure(err) => return Err(err.clone()),
        };
        Ok(StoredObject {
            metadata,
            body: self.tracked(body),
        })
    }

    async fn stat(&self, location: &ObjectLocation) -> FetchResult<ObjectMetadata> {
        match self.entry(location)? {
            Entry::Object { metadata, .. } | Entry::Endless { metadata } => Ok(metadata.clone()),
            Entry::Failure(err) => Err(err.clone()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts one live body until dropped.
#[derive(Debug)]
struct LiveStream(Arc<AtomicUsize>);

impl LiveStream {
    fn acquire(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Hex-encoded MD5 of the content.
fn content_etag(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}
