//! Object and error response serialization.
//!
//! Object responses carry the same validator and cache headers whether they
//! are `200`, `304`, or a `HEAD` reply; only `Content-Length` and the body
//! differ between them. Error responses are small JSON documents.

use chrono::{DateTime, Utc};
use crawlspace_storage::ObjectMetadata;
use http::header::{
    CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderName, HeaderValue, LAST_MODIFIED,
};
use http::StatusCode;
use serde::Serialize;

use crate::body::ProxyBody;
use crate::error::ProxyError;
use crate::media::media_type;

/// JSON error document.
#[derive(Debug, Serialize)]
struct ErrorDocument<'a> {
    code: &'a str,
    detail: String,
}

/// Headers shared by every response describing one object.
#[derive(Debug, Clone)]
pub struct ObjectHeaders {
    content_type: String,
    content_length: Option<u64>,
    etag: Option<String>,
    last_modified: Option<DateTime<Utc>>,
    cache_max_age: u64,
}

impl ObjectHeaders {
    /// Derive response headers from backend metadata.
    #[must_use]
    pub fn new(key: &str, metadata: &ObjectMetadata, cache_max_age: u64) -> Self {
        Self {
            content_type: media_type(key, metadata.content_type.as_deref()),
            content_length: metadata.content_length,
            etag: metadata.etag.clone(),
            last_modified: metadata.last_modified,
            cache_max_age,
        }
    }

    /// The unquoted entity tag, if the backend reported one.
    #[must_use]
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Build a response with these headers.
    ///
    /// `Content-Length` is omitted for `304 Not Modified`.
    #[must_use]
    pub fn into_response(self, status: StatusCode, body: ProxyBody) -> http::Response<ProxyBody> {
        let mut builder = http::Response::builder()
            .status(status)
            .header(CONTENT_TYPE, self.content_type.as_str())
            .header(
                CACHE_CONTROL,
                format!("private, max-age={}", self.cache_max_age),
            );
        if status != StatusCode::NOT_MODIFIED {
            if let Some(len) = self.content_length {
                builder = builder.header(CONTENT_LENGTH, len);
            }
        }
        builder = set_optional_header(
            builder,
            &ETAG,
            self.etag.as_deref().map(|e| format!("\"{e}\"")).as_deref(),
        );
        builder = set_optional_timestamp_header(builder, &LAST_MODIFIED, self.last_modified.as_ref());

        builder.body(body).unwrap_or_else(|_| {
            http::Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(ProxyBody::empty())
                .expect("static response should be valid")
        })
    }
}

/// Set an optional header on a response builder if the value is `Some` and valid.
fn set_optional_header(
    builder: http::response::Builder,
    name: &HeaderName,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

/// Set an optional HTTP date header from a `DateTime<Utc>`.
fn set_optional_timestamp_header(
    builder: http::response::Builder,
    name: &HeaderName,
    value: Option<&DateTime<Utc>>,
) -> http::response::Builder {
    let formatted = value.map(|v| v.format("%a, %d %b %Y %H:%M:%S GMT").to_string());
    set_optional_header(builder, name, formatted.as_deref())
}

/// Serialize a value as a JSON response.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> http::Response<ProxyBody> {
    let body = match serde_json::to_vec(value) {
        Ok(bytes) => ProxyBody::from_bytes(bytes),
        Err(_) => {
            return http::Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(ProxyBody::empty())
                .expect("static response should be valid");
        }
    };
    http::Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .expect("JSON response should be valid")
}

/// Convert a [`ProxyError`] into its JSON error response.
#[must_use]
pub fn error_to_response(err: &ProxyError) -> http::Response<ProxyBody> {
    let document = ErrorDocument {
        code: err.code(),
        detail: err.detail(),
    };
    let mut response = json_response(err.status_code(), &document);
    if matches!(err, ProxyError::MethodNotAllowed(_)) {
        response
            .headers_mut()
            .insert(http::header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    }
    response
}
