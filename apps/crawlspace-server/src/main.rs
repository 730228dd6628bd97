//! Crawlspace server: serves HiPS and other static astronomy data from
//! object storage.
//!
//! # Usage
//!
//! ```text
//! DATASETS='{"dp1":{"bucketName":"hips-dp1","objectPrefix":"images"}}' \
//!   DEFAULT_DATASET=dp1 crawlspace
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `GATEWAY_LISTEN` | `0.0.0.0:8080` | Bind address |
//! | `DATASETS` | *(unset)* | JSON map of dataset key to `{bucketName, objectPrefix}` |
//! | `GCS_BUCKET` / `GCS_OBJECT_PREFIX` | *(unset)* | Single-dataset shorthand |
//! | `DEFAULT_DATASET` | *(unset)* | Dataset served by the legacy URL shape |
//! | `STORAGE_BACKEND` | `gcs` | `gcs` or `filesystem` |
//! | `GCS_PROJECT` | *(empty)* | Project the buckets belong to |
//! | `GCS_USER_PROJECT` | *(unset)* | Requester-pays project billed for reads |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_PROFILE` | `production` | `production` (JSON) or `development` (text) |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::net::SocketAddr;

use anyhow::{Context, Result};
use crawlspace_core::{BucketRegistry, CrawlspaceConfig, LogProfile, StorageBackendKind};
use crawlspace_http::{CrawlspaceHttpService, ProxyHandler, ServiceMetadata};
use crawlspace_storage::{FilesystemBackend, GcsBackend, StorageBackend};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, profile: LogProfile) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match profile {
        LogProfile::Production => builder.json().init(),
        LogProfile::Development => builder.init(),
    }

    Ok(())
}

/// Validate the configured datasets.
fn load_registry(config: &CrawlspaceConfig) -> Result<BucketRegistry> {
    config
        .bucket_registry()
        .context("invalid dataset configuration")
}

/// Build the request handler over the chosen backend.
fn build_handler<S: StorageBackend>(
    config: &CrawlspaceConfig,
    registry: BucketRegistry,
    backend: S,
) -> Result<ProxyHandler<S>> {
    let resolver = config.path_resolver().context("invalid URL prefixes")?;
    Ok(ProxyHandler::new(resolver, registry, backend).with_cache_max_age(config.cache_max_age))
}

/// Bind the listener and serve until Ctrl-C.
async fn run<S: StorageBackend>(
    config: &CrawlspaceConfig,
    registry: BucketRegistry,
    backend: S,
) -> Result<()> {
    let handler = build_handler(config, registry, backend)?;
    info!(
        datasets = ?handler.registry().dataset_keys().collect::<Vec<_>>(),
        default_dataset = ?handler.registry().default_dataset(),
        "dataset registry loaded"
    );
    let service = CrawlspaceHttpService::new(handler, ServiceMetadata::new(&config.name));

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, "listening for connections");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };
    crawlspace_http::serve(listener, service, shutdown).await;
    Ok(())
}

/// Perform a health check by connecting to the gateway and requesting the health endpoint.
///
/// Exits with code 0 if healthy, 1 otherwise.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"status\":\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = CrawlspaceConfig::from_env().context("failed to load configuration")?;

    // Handle --health-check flag for Docker HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    init_tracing(&config.log_level, config.log_profile)?;

    info!(
        gateway_listen = %config.gateway_listen,
        url_prefix = %config.url_prefix,
        v2_url_prefix = %config.v2_url_prefix,
        storage = ?config.storage,
        version = VERSION,
        "starting Crawlspace",
    );

    let registry = load_registry(&config)?;
    match config.storage.backend {
        StorageBackendKind::Gcs => {
            let backend = GcsBackend::new(
                &config.storage.gcs_endpoint,
                config.storage.gcs_access_token.clone(),
                registry.gcs_project(),
            )
            .context("failed to create storage client")?
            .with_user_project(config.storage.gcs_user_project.clone());
            info!(project = backend.project(), "storage client ready");
            run(&config, registry, backend).await
        }
        StorageBackendKind::Filesystem => {
            let backend = FilesystemBackend::new(&config.storage.filesystem_root);
            run(&config, registry, backend).await
        }
    }
}
