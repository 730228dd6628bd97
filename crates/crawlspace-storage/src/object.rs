//! Object metadata and byte streams returned by storage backends.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use futures::stream::BoxStream;

/// Metadata reported by the backend for one object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    /// Media type recorded by the backend, if any.
    pub content_type: Option<String>,
    /// Size in bytes, when known up front.
    pub content_length: Option<u64>,
    /// Revision token, unquoted.
    pub etag: Option<String>,
    /// Last modification time.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Forward-only, single-consumer object body.
///
/// Dropping the stream releases the underlying backend connection or file
/// handle; [`ObjectStream::close`] makes that explicit at call sites.
pub struct ObjectStream {
    inner: BoxStream<'static, io::Result<Bytes>>,
}

impl ObjectStream {
    /// Wrap a stream of body chunks.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    /// A stream that yields nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(futures::stream::empty())
    }

    /// Release the stream without reading the rest of it.
    pub fn close(self) {
        drop(self);
    }
}

impl fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream").finish_non_exhaustive()
    }
}

impl Stream for ObjectStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An object found by [`StorageBackend::fetch`](crate::StorageBackend::fetch).
#[derive(Debug)]
pub struct StoredObject {
    /// Object metadata.
    pub metadata: ObjectMetadata,
    /// Object body.
    pub body: ObjectStream,
}

impl StoredObject {
    /// Split into metadata and body.
    #[must_use]
    pub fn into_parts(self) -> (ObjectMetadata, ObjectStream) {
        (self.metadata, self.body)
    }
}

/// Strip weak-validator and quote decoration from an entity tag.
#[must_use]
pub fn unquote_etag(raw: &str) -> &str {
    let raw = raw.trim();
    let raw = raw.strip_prefix("W/").unwrap_or(raw);
    raw.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw)
}
