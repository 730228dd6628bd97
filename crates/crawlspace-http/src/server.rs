//! Connection accept loop with graceful shutdown.

use std::future::Future;

use crawlspace_storage::StorageBackend;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::service::CrawlspaceHttpService;

/// Serve connections from `listener` until `shutdown` resolves.
///
/// Each connection runs on its own task and speaks HTTP/1.1 or HTTP/2. After
/// `shutdown` resolves no new connections are accepted and the call returns
/// once in-flight requests have finished.
pub async fn serve<S, F>(listener: TcpListener, service: CrawlspaceHttpService<S>, shutdown: F)
where
    S: StorageBackend,
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    // Clients dropping mid-body surface here; the body and its
                    // storage stream have already been released by then.
                    if let Err(e) = conn.await {
                        debug!(peer_addr = %peer_addr, error = %e, "connection closed with error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained");
}
