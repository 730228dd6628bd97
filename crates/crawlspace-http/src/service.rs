//! The Crawlspace HTTP service implementing hyper's `Service` trait.
//!
//! [`CrawlspaceHttpService`] wraps a [`ProxyHandler`] and handles everything
//! around it:
//!
//! 1. Health check interception (`GET /health`)
//! 2. Service metadata (`GET /`)
//! 3. Method filtering (only `GET` and `HEAD` reach the handler)
//! 4. Error response formatting
//! 5. Common response headers (`X-Request-Id`, `Server`)

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crawlspace_storage::StorageBackend;
use http::header::HeaderValue;
use http::{Method, StatusCode};
use serde::Serialize;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::body::ProxyBody;
use crate::error::ProxyError;
use crate::handler::ProxyHandler;
use crate::response::{error_to_response, json_response};

/// Value of the `Server` response header.
const SERVER_NAME: &str = "Crawlspace";

/// Response header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Service description returned by `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceMetadata {
    /// Configured service name.
    pub name: String,
    /// Package version.
    pub version: String,
    /// One-line description.
    pub description: String,
    /// Source repository.
    pub repository_url: String,
    /// Documentation home.
    pub documentation_url: String,
}

impl ServiceMetadata {
    /// Metadata for this build under the given service name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            description: "File server for HiPS and other static astronomy data".to_owned(),
            repository_url: env!("CARGO_PKG_REPOSITORY").to_owned(),
            documentation_url: env!("CARGO_PKG_HOMEPAGE").to_owned(),
        }
    }
}

impl Default for ServiceMetadata {
    fn default() -> Self {
        Self::new("crawlspace")
    }
}

/// The Crawlspace HTTP service.
///
/// Cloning is cheap: the handler and metadata are shared.
#[derive(Debug)]
pub struct CrawlspaceHttpService<S> {
    handler: Arc<ProxyHandler<S>>,
    metadata: Arc<ServiceMetadata>,
}

impl<S: StorageBackend> CrawlspaceHttpService<S> {
    /// Create a service around a handler.
    #[must_use]
    pub fn new(handler: ProxyHandler<S>, metadata: ServiceMetadata) -> Self {
        Self::from_shared(Arc::new(handler), metadata)
    }

    /// Create a service from an already shared handler.
    #[must_use]
    pub fn from_shared(handler: Arc<ProxyHandler<S>>, metadata: ServiceMetadata) -> Self {
        Self {
            handler,
            metadata: Arc::new(metadata),
        }
    }

    /// The wrapped handler.
    #[must_use]
    pub fn handler(&self) -> &ProxyHandler<S> {
        &self.handler
    }
}

impl<S> Clone for CrawlspaceHttpService<S> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            metadata: Arc::clone(&self.metadata),
        }
    }
}

impl<S, B> hyper::service::Service<http::Request<B>> for CrawlspaceHttpService<S>
where
    S: StorageBackend,
    B: Send + 'static,
{
    type Response = http::Response<ProxyBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let metadata = Arc::clone(&self.metadata);

        Box::pin(async move {
            let request_id = Uuid::new_v4().to_string();
            let response = process_request(req, &handler, &metadata, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Process one request. Request bodies are never read.
async fn process_request<S: StorageBackend, B>(
    req: http::Request<B>,
    handler: &ProxyHandler<S>,
    metadata: &ServiceMetadata,
    request_id: &str,
) -> http::Response<ProxyBody> {
    let (parts, body) = req.into_parts();
    drop(body);
    let method = parts.method.clone();
    let uri = &parts.uri;
    let path = uri.path();

    if is_health_check(&method, path) {
        return health_check_response();
    }
    if is_index(&method, path) {
        return json_response(StatusCode::OK, metadata);
    }

    info!(%method, %uri, request_id, "routed request");

    if method != Method::GET && method != Method::HEAD {
        let err = ProxyError::MethodNotAllowed(method);
        debug!(error = %err, request_id, "rejected request");
        return error_to_response(&err);
    }

    match handler.handle(&method, path, &parts.headers).await {
        Ok(response) => {
            debug!(status = %response.status(), request_id, "request served");
            response
        }
        Err(err) => {
            if err.is_server_error() {
                error!(error = %err, code = err.code(), request_id, "request failed");
            } else {
                debug!(error = %err, code = err.code(), request_id, "request rejected");
            }
            error_to_response(&err)
        }
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &Method, path: &str) -> bool {
    (*method == Method::GET || *method == Method::HEAD) && path == "/health"
}

/// Check if the request asks for service metadata.
fn is_index(method: &Method, path: &str) -> bool {
    (*method == Method::GET || *method == Method::HEAD) && path == "/"
}

/// Produce a health check response.
fn health_check_response() -> http::Response<ProxyBody> {
    http::Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(ProxyBody::from_string(r#"{"status":"running"}"#))
        .expect("static health response should be valid")
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<ProxyBody>,
    request_id: &str,
) -> http::Response<ProxyBody> {
    let headers = response.headers_mut();
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, hv);
    }
    headers.insert(http::header::SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}
