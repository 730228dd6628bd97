//! Core types, configuration, and request resolution for Crawlspace.
//!
//! This crate turns a request path into a storage location:
//!
//! ```text
//! "/api/hips/v2/ds2/some/image.jpg"
//!   -> PathResolver      (dataset "ds2", relative path "some/image.jpg")
//!   -> BucketRegistry    (bucket "someotherbucket", prefix "someprefix")
//!   -> build_object_key  ("someprefix/some/image.jpg")
//! ```
//!
//! None of these steps touch the network; fetching the object is the job of
//! `crawlspace-storage`.

mod config;
mod error;
mod key;
mod registry;
mod resolver;

pub use config::{
    CrawlspaceConfig, DEFAULT_GCS_ENDPOINT, LogProfile, SINGLE_BUCKET_DATASET, StorageBackendKind,
    StorageSettings,
};
pub use error::{
    CrawlspaceError, CrawlspaceResult, LookupError, ParseError, RegistryError, TraversalError,
};
pub use key::{ObjectLocation, build_object_key};
pub use registry::{BucketConfig, BucketRegistry, RegistryState};
pub use resolver::{DEFAULT_URL_PREFIX, DEFAULT_V2_URL_PREFIX, PathResolver, ResolvedRequest};
