//! Request failures and their HTTP status mapping.

use crawlspace_core::{LookupError, ParseError, TraversalError};
use crawlspace_storage::FetchError;
use http::StatusCode;

/// Every way a proxied request can fail.
///
/// Each variant maps to exactly one status code and a stable machine-readable
/// code. The client-facing detail never includes backend error text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProxyError {
    /// The path matches no route or has no object path.
    #[error(transparent)]
    BadPath(#[from] ParseError),

    /// The object path escapes the dataset root.
    #[error(transparent)]
    Traversal(#[from] TraversalError),

    /// The dataset key is not configured.
    #[error("unknown dataset {key}")]
    UnknownDataset {
        /// The requested key.
        key: String,
        /// Configured keys, sorted.
        available: Vec<String>,
    },

    /// A legacy path was used but no default dataset is configured.
    #[error("no default dataset is configured")]
    NoDefaultDataset,

    /// The object does not exist.
    #[error("object not found")]
    NotFound,

    /// The storage backend refused access.
    #[error("access denied by storage backend")]
    AccessDenied,

    /// The storage backend failed.
    #[error("storage backend error: {detail}")]
    Backend {
        /// Backend-internal description, logged but never returned.
        detail: String,
    },

    /// Only `GET` and `HEAD` are served.
    #[error("method {0} not allowed")]
    MethodNotAllowed(http::Method),
}

impl ProxyError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadPath(_) | Self::UnknownDataset { .. } | Self::NotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Traversal(_) => StatusCode::BAD_REQUEST,
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::NoDefaultDataset => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend { .. } => StatusCode::BAD_GATEWAY,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadPath(_) => "bad_path",
            Self::Traversal(_) => "path_traversal",
            Self::UnknownDataset { .. } => "unknown_dataset",
            Self::NoDefaultDataset => "no_default_dataset",
            Self::NotFound => "not_found",
            Self::AccessDenied => "access_denied",
            Self::Backend { .. } => "backend_error",
            Self::MethodNotAllowed(_) => "method_not_allowed",
        }
    }

    /// Client-facing description.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::BadPath(_) => "No route matches the requested path".to_owned(),
            Self::Traversal(_) => "Path escapes the dataset root".to_owned(),
            Self::UnknownDataset { key, available } => format!(
                "Dataset {key} not found. Available datasets: {}",
                available.join(", ")
            ),
            Self::NoDefaultDataset => {
                "No default dataset is configured for this path".to_owned()
            }
            Self::NotFound => "Object not found".to_owned(),
            Self::AccessDenied => "Access to the object was denied".to_owned(),
            Self::Backend { .. } => "Storage backend request failed".to_owned(),
            Self::MethodNotAllowed(method) => format!("Method {method} not allowed"),
        }
    }

    /// Whether the failure is on the server side rather than in the request.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<LookupError> for ProxyError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NoDefaultDataset => Self::NoDefaultDataset,
            LookupError::UnknownDataset { key, available } => {
                Self::UnknownDataset { key, available }
            }
        }
    }
}

impl From<FetchError> for ProxyError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotFound => Self::NotFound,
            FetchError::AccessDenied => Self::AccessDenied,
            FetchError::Backend { detail } => Self::Backend { detail },
        }
    }
}
