//! Per-request proxy pipeline.
//!
//! A request moves through resolve path, look up dataset, build object key,
//! and read from storage. Any step may end the request with a [`ProxyError`];
//! none is retried, so each client request causes at most one backend read.

use std::sync::Arc;

use crawlspace_core::{BucketRegistry, ObjectLocation, PathResolver};
use crawlspace_storage::StorageBackend;
use http::{HeaderMap, Method, StatusCode};
use tracing::debug;

use crate::body::ProxyBody;
use crate::conditional::IfNoneMatch;
use crate::error::ProxyError;
use crate::response::ObjectHeaders;

/// Default `Cache-Control` max-age in seconds.
pub const DEFAULT_CACHE_MAX_AGE: u64 = 3600;

/// Serves objects for dataset-scoped paths.
///
/// The registry and resolver are fixed at construction and shared read-only
/// by every request.
#[derive(Debug)]
pub struct ProxyHandler<S> {
    resolver: PathResolver,
    registry: Arc<BucketRegistry>,
    backend: S,
    cache_max_age: u64,
}

impl<S: StorageBackend> ProxyHandler<S> {
    /// Create a handler over a validated registry and a storage backend.
    #[must_use]
    pub fn new(resolver: PathResolver, registry: impl Into<Arc<BucketRegistry>>, backend: S) -> Self {
        Self {
            resolver,
            registry: registry.into(),
            backend,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
        }
    }

    /// Override the `Cache-Control` max-age.
    #[must_use]
    pub fn with_cache_max_age(mut self, seconds: u64) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// The dataset registry.
    #[must_use]
    pub fn registry(&self) -> &BucketRegistry {
        &self.registry
    }

    /// The storage backend.
    #[must_use]
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Map a request path to the object it names.
    pub fn locate(&self, path: &str) -> Result<ObjectLocation, ProxyError> {
        let resolved = self.resolver.resolve(path)?;
        debug!(
            dataset = resolved.dataset.as_deref().unwrap_or("<default>"),
            relative_path = %resolved.relative_path,
            "path resolved"
        );

        let config = self.registry.lookup(resolved.dataset.as_deref())?;
        debug!(bucket = %config.bucket_name, prefix = %config.object_prefix, "dataset resolved");

        let location = ObjectLocation::resolve(config, &resolved.relative_path)?;
        debug!(%location, "object key built");
        Ok(location)
    }

    /// Serve a `GET` or `HEAD` request for `path`.
    pub async fn handle(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<http::Response<ProxyBody>, ProxyError> {
        let location = self.locate(path)?;
        let condition = IfNoneMatch::from_headers(headers);

        if *method == Method::HEAD {
            let metadata = self.backend.stat(&location).await?;
            let headers = ObjectHeaders::new(&location.key, &metadata, self.cache_max_age);
            let status = not_modified_or_ok(condition.as_ref(), &headers);
            debug!(%location, %status, "object metadata read");
            return Ok(headers.into_response(status, ProxyBody::empty()));
        }
        if *method != Method::GET {
            return Err(ProxyError::MethodNotAllowed(method.clone()));
        }

        let (metadata, body) = self.backend.fetch(&location).await?.into_parts();
        let headers = ObjectHeaders::new(&location.key, &metadata, self.cache_max_age);
        if not_modified_or_ok(condition.as_ref(), &headers) == StatusCode::NOT_MODIFIED {
            body.close();
            debug!(%location, "client copy is current");
            return Ok(headers.into_response(StatusCode::NOT_MODIFIED, ProxyBody::empty()));
        }

        debug!(%location, length = ?metadata.content_length, "streaming object");
        Ok(headers.into_response(StatusCode::OK, ProxyBody::streaming(body)))
    }
}

fn not_modified_or_ok(condition: Option<&IfNoneMatch>, headers: &ObjectHeaders) -> StatusCode {
    match (condition, headers.etag()) {
        (Some(condition), Some(etag)) if condition.matches(etag) => StatusCode::NOT_MODIFIED,
        _ => StatusCode::OK,
    }
}
