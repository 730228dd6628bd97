//! Object storage backends for Crawlspace.
//!
//! The [`StorageBackend`] trait is the read-only boundary between the HTTP
//! handler and object storage. Three implementations are provided:
//!
//! - [`GcsBackend`]: Google Cloud Storage through its JSON API, streaming
//!   object bodies with `reqwest`.
//! - [`FilesystemBackend`]: a local directory tree, where each bucket is a
//!   top-level directory.
//! - [`MemoryBackend`]: a fixed set of in-memory objects that counts live
//!   bodies, for tests.
//!
//! Object bodies are returned as an [`ObjectStream`]. Dropping the stream
//! releases the underlying connection or file handle.

pub mod backend;
pub mod error;
pub mod filesystem;
pub mod gcs;
pub mod memory;
pub mod object;

pub use backend::StorageBackend;
pub use error::{FetchError, FetchResult};
pub use filesystem::FilesystemBackend;
pub use gcs::GcsBackend;
pub use memory::MemoryBackend;
pub use object::{ObjectMetadata, ObjectStream, StoredObject, unquote_etag};
