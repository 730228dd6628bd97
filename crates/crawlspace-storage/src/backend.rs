//! The storage backend boundary.

use std::sync::Arc;

use async_trait::async_trait;
use crawlspace_core::ObjectLocation;

use crate::error::FetchResult;
use crate::object::{ObjectMetadata, StoredObject};

/// Read-only access to objects in a storage backend.
///
/// One implementation exists per backend kind and is chosen when the server
/// is constructed. Implementations issue exactly one backend read per call and
/// never retry.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Open the object for streaming.
    ///
    /// The returned body is read lazily in chunks; it must not be buffered
    /// whole.
    async fn fetch(&self, location: &ObjectLocation) -> FetchResult<StoredObject>;

    /// Read the object's metadata without its body.
    async fn stat(&self, location: &ObjectLocation) -> FetchResult<ObjectMetadata>;
}

#[async_trait]
impl<T: StorageBackend + ?Sized> StorageBackend for Arc<T> {
    async fn fetch(&self, location: &ObjectLocation) -> FetchResult<StoredObject> {
        (**self).fetch(location).await
    }

    async fn stat(&self, location: &ObjectLocation) -> FetchResult<ObjectMetadata> {
        (**self).stat(location).await
    }
}
