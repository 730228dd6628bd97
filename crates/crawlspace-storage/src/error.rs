//! Storage fetch errors.

/// Why an object could not be read.
///
/// Backends never retry; every failure surfaces to the caller exactly once.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The object does not exist.
    #[error("object not found")]
    NotFound,

    /// The backend refused the read for permission or authentication reasons.
    #[error("access denied by storage backend")]
    AccessDenied,

    /// Any other backend failure: timeouts, transport errors, bad responses.
    #[error("storage backend error: {detail}")]
    Backend {
        /// Backend-internal description, for logs only.
        detail: String,
    },
}

impl FetchError {
    /// Create a [`FetchError::Backend`] from anything displayable.
    pub fn backend(detail: impl std::fmt::Display) -> Self {
        Self::Backend {
            detail: detail.to_string(),
        }
    }
}

/// Result of a storage read.
pub type FetchResult<T> = Result<T, FetchError>;
