//! HTTP layer for Crawlspace.
//!
//! This crate turns `GET` and `HEAD` requests for dataset-scoped paths into
//! streamed storage reads:
//!
//! - **Handler** ([`handler`]): the per-request pipeline. Resolves the path,
//!   looks up the dataset, builds the object key, and reads from the
//!   [`StorageBackend`](crawlspace_storage::StorageBackend).
//!
//! - **Errors** ([`error`]): [`ProxyError`] and its status mapping.
//!
//! - **Responses** ([`response`]): object headers (`ETag`, `Last-Modified`,
//!   `Cache-Control`) and JSON error bodies. [`media`] picks `Content-Type`
//!   and [`conditional`] evaluates `If-None-Match`.
//!
//! - **Service** ([`service`]): [`CrawlspaceHttpService`], the hyper `Service`
//!   that adds health checks, service metadata, method filtering, and common
//!   headers around the handler.
//!
//! - **Server** ([`server`]): the accept loop with graceful shutdown.
//!
//! - **Body** ([`body`]): [`ProxyBody`], which streams object bodies and
//!   releases the storage stream when dropped.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> CrawlspaceHttpService (hyper Service)
//!     -> Health check / service metadata interception
//!     -> Method filter (GET, HEAD)
//!     -> ProxyHandler
//!       -> PathResolver -> BucketRegistry -> object key
//!       -> StorageBackend::fetch / stat
//!       -> If-None-Match evaluation
//!     -> Common response headers (X-Request-Id, Server)
//!   <- HTTP Response (streamed body)
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use crawlspace_core::{BucketRegistry, PathResolver, RegistryState};
//! use crawlspace_http::{CrawlspaceHttpService, ProxyHandler, ServiceMetadata};
//! use crawlspace_storage::FilesystemBackend;
//!
//! let registry = BucketRegistry::new(RegistryState::default()).unwrap();
//! let handler = ProxyHandler::new(PathResolver::default(), registry, FilesystemBackend::new("./data"));
//! let service = CrawlspaceHttpService::new(handler, ServiceMetadata::default());
//! // Use `service` with `crawlspace_http::server::serve`.
//! ```

pub mod body;
pub mod conditional;
pub mod error;
pub mod handler;
pub mod media;
pub mod response;
pub mod server;
pub mod service;

pub use body::ProxyBody;
pub use error::ProxyError;
pub use handler::{DEFAULT_CACHE_MAX_AGE, ProxyHandler};
pub use server::serve;
pub use service::{CrawlspaceHttpService, REQUEST_ID_HEADER, ServiceMetadata};
