//! End-to-end tests for the Crawlspace server.
//!
//! Each test starts the real hyper service on an ephemeral local port and
//! talks to it over TCP with `reqwest`. Run them with:
//!
//! ```text
//! cargo test -p crawlspace-integration
//! ```

use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;

use crawlspace_core::{BucketConfig, BucketRegistry, PathResolver, RegistryState};
use crawlspace_http::{CrawlspaceHttpService, ProxyHandler, ServiceMetadata};
use crawlspace_storage::StorageBackend;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

mod test_conditional;
mod test_errors;
mod test_filesystem;
mod test_routing;
mod test_streaming;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Registry with `ds1` (no prefix) and `ds2` (prefixed), as used throughout
/// the tests.
#[must_use]
pub fn scenario_registry(default: Option<&str>) -> RegistryState {
    let mut state = RegistryState {
        gcs_project: "some-project".to_owned(),
        default_bucket_key: default.map(str::to_owned),
        ..RegistryState::default()
    };
    state
        .buckets
        .insert("ds1".to_owned(), BucketConfig::new("somebucket", ""));
    state.buckets.insert(
        "ds2".to_owned(),
        BucketConfig::new("someotherbucket", "someprefix"),
    );
    state
}

/// A server running on a local ephemeral port.
#[derive(Debug)]
pub struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Start a server over `backend` with default URL prefixes.
    pub async fn start<S: StorageBackend>(state: RegistryState, backend: S) -> Self {
        init_tracing();

        let registry = BucketRegistry::new(state).expect("valid registry");
        let handler = ProxyHandler::new(PathResolver::default(), registry, backend);
        let service = CrawlspaceHttpService::new(handler, ServiceMetadata::new("crawlspace-test"));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(crawlspace_http::serve(listener, service, async {
            rx.await.ok();
        }));

        Self {
            addr,
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    /// Absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        if let Some(task) = self.task.take() {
            tokio::time::timeout(Duration::from_secs(5), task)
                .await
                .expect("server drained in time")
                .expect("server task");
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// HTTP client for the tests.
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("client")
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
