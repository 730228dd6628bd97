//! Error types for the Crawlspace core.

/// Core error type for Crawlspace infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum CrawlspaceError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The dataset registry could not be built from the configuration.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Convenience result type for Crawlspace operations.
pub type CrawlspaceResult<T> = Result<T, CrawlspaceError>;

/// Rejected registry configuration, detected once at construction time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The configured default dataset is not one of the configured datasets.
    #[error("default dataset {key} not found in configured datasets: {available}")]
    DefaultDatasetMissing {
        /// The default dataset key.
        key: String,
        /// Comma-separated list of configured dataset keys.
        available: String,
    },

    /// Two dataset keys differ only in letter case.
    #[error("dataset keys {first} and {second} differ only in case")]
    AmbiguousDatasetKeys {
        /// The first key, in sorted order.
        first: String,
        /// The second key, in sorted order.
        second: String,
    },

    /// A dataset key is empty or contains a path separator.
    #[error("invalid dataset key {0:?}")]
    InvalidDatasetKey(String),

    /// A dataset has no bucket name.
    #[error("dataset {0} has an empty bucket name")]
    EmptyBucketName(String),
}

/// A registry lookup miss.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// No dataset was named and no default dataset is configured.
    #[error("no default dataset is configured")]
    NoDefaultDataset,

    /// The named dataset is not configured.
    #[error("unknown dataset {key}")]
    UnknownDataset {
        /// The requested dataset key.
        key: String,
        /// The configured dataset keys, sorted.
        available: Vec<String>,
    },
}

/// The request path matches neither supported URL shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unroutable path {path}: {reason}")]
pub struct ParseError {
    /// The raw request path.
    pub path: String,
    /// Why the path was rejected.
    pub reason: &'static str,
}

impl ParseError {
    pub(crate) fn new(path: impl Into<String>, reason: &'static str) -> Self {
        Self {
            path: path.into(),
            reason,
        }
    }
}

/// The relative path would escape the dataset's namespace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("path {path} does not resolve to an object below the dataset root")]
pub struct TraversalError {
    /// The offending relative path.
    pub path: String,
}
