//! Google Cloud Storage backend over the JSON API.
//!
//! A GET is a single media download (`?alt=media`) whose body is streamed
//! through as it arrives; a HEAD is a single metadata request. Credentials
//! are not acquired here: the host may hand in a bearer token, or point the
//! endpoint at an emulator that needs none.
//!
//! Reads are billed to the bucket owner. A requester-pays project is only sent
//! (as `x-goog-user-project`) when one is set with
//! [`GcsBackend::with_user_project`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crawlspace_core::{DEFAULT_GCS_ENDPOINT, ObjectLocation};
use futures::TryStreamExt;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG, HeaderMap, HeaderName, LAST_MODIFIED};
use serde::Deserialize;
use tracing::{debug, trace};

use crate::backend::StorageBackend;
use crate::error::{FetchError, FetchResult};
use crate::object::{ObjectMetadata, ObjectStream, StoredObject, unquote_etag};

/// Characters left unescaped in bucket and object path segments.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Object resource returned by the JSON API metadata endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GcsObjectResource {
    content_type: Option<String>,
    /// Sent as a decimal string.
    size: Option<String>,
    etag: Option<String>,
    updated: Option<DateTime<Utc>>,
}

impl From<GcsObjectResource> for ObjectMetadata {
    fn from(resource: GcsObjectResource) -> Self {
        Self {
            content_type: resource.content_type,
            content_length: resource.size.and_then(|s| s.parse().ok()),
            etag: resource.etag.map(|e| unquote_etag(&e).to_owned()),
            last_modified: resource.updated,
        }
    }
}

/// Google Cloud Storage backend.
#[derive(Clone)]
pub struct GcsBackend {
    client: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    project: String,
    user_project: Option<String>,
}

impl fmt::Debug for GcsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcsBackend")
            .field("endpoint", &self.endpoint)
            .field("access_token", &self.access_token.as_ref().map(|_| "..."))
            .field("project", &self.project)
            .field("user_project", &self.user_project)
            .finish_non_exhaustive()
    }
}

impl GcsBackend {
    /// Create a backend with its own HTTP client.
    pub fn new(
        endpoint: impl Into<String>,
        access_token: Option<String>,
        project: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, endpoint, access_token, project))
    }

    /// Create a backend around an existing HTTP client.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        access_token: Option<String>,
        project: &str,
    ) -> Self {
        let endpoint = endpoint.into();
        let endpoint = if endpoint.trim().is_empty() {
            DEFAULT_GCS_ENDPOINT.to_owned()
        } else {
            endpoint.trim_end_matches('/').to_owned()
        };
        Self {
            client,
            endpoint,
            access_token,
            project: project.to_owned(),
            user_project: None,
        }
    }

    /// Bill reads to `project` as a requester-pays caller.
    #[must_use]
    pub fn with_user_project(mut self, project: Option<String>) -> Self {
        self.user_project = project.filter(|p| !p.is_empty());
        self
    }

    /// The project the buckets belong to.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    fn object_url(&self, location: &ObjectLocation) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.endpoint,
            utf8_percent_encode(&location.bucket, PATH_SEGMENT),
            utf8_percent_encode(&location.key, PATH_SEGMENT),
        )
    }

    async fn get(&self, url: &str) -> FetchResult<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        if let Some(project) = &self.user_project {
            request = request.header("x-goog-user-project", project);
        }

        let response = request.send().await.map_err(FetchError::backend)?;
        let status = response.status();
        trace!(%url, %status, "storage backend responded");
        if status.is_success() {
            Ok(response)
        } else {
            Err(status_to_error(status))
        }
    }
}

#[async_trait]
impl StorageBackend for GcsBackend {
    async fn fetch(&self, location: &ObjectLocation) -> FetchResult<StoredObject> {
        let url = format!("{}?alt=media", self.object_url(location));
        debug!(%location, "downloading object");

        let response = self.get(&url).await?;
        let metadata = metadata_from_headers(response.headers());
        let body = response.bytes_stream().map_err(std::io::Error::other);

        Ok(StoredObject {
            metadata,
            body: ObjectStream::new(body),
        })
    }

    async fn stat(&self, location: &ObjectLocation) -> FetchResult<ObjectMetadata> {
        let url = self.object_url(location);
        debug!(%location, "reading object metadata");

        let resource: GcsObjectResource = self
            .get(&url)
            .await?
            .json()
            .await
            .map_err(FetchError::backend)?;
        Ok(resource.into())
    }
}

fn status_to_error(status: StatusCode) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::AccessDenied,
        other => FetchError::backend(format!("unexpected response status {other}")),
    }
}

fn metadata_from_headers(headers: &HeaderMap) -> ObjectMetadata {
    ObjectMetadata {
        content_type: header_str(headers, &CONTENT_TYPE).map(ToOwned::to_owned),
        content_length: header_str(headers, &CONTENT_LENGTH).and_then(|v| v.trim().parse().ok()),
        etag: header_str(headers, &ETAG).map(|v| unquote_etag(v).to_owned()),
        last_modified: header_str(headers, &LAST_MODIFIED)
            .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
