//! HTTP server binding and lifecycle.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::http_router::{api_router, AppState};

/// The bound HTTP surface.
///
/// [`HttpServer::bind`] fails fast so bootstrap can abort with a
/// non-zero exit; [`HttpServer::serve`] runs until the shutdown notify
/// fires, then drains in-flight requests for a bounded grace period.
pub struct HttpServer {
    listener: TcpListener,
    state: AppState,
}

impl HttpServer {
    pub async fn bind(addr: SocketAddr, state: AppState) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "HTTP server listening");
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves until `shutdown` fires, then stops accepting and drains
    /// for at most `grace` before giving up on stragglers.
    ///
    /// Signal shutdown with [`Notify::notify_waiters`]: both the accept
    /// loop and this method wait on it.
    pub async fn serve(self, shutdown: Arc<Notify>, grace: Duration) -> std::io::Result<()> {
        let router = api_router(self.state);
        let drain_signal = Arc::clone(&shutdown);

        let mut server = tokio::spawn(
            axum::serve(self.listener, router)
                .with_graceful_shutdown(async move {
                    drain_signal.notified().await;
                })
                .into_future(),
        );

        tokio::select! {
            joined = &mut server => {
                // the server ended on its own (accept failure)
                return match joined {
                    Ok(result) => result,
                    Err(_) => Ok(()),
                };
            }
            _ = shutdown.notified() => {}
        }

        info!("HTTP server draining in-flight requests");
        match tokio::time::timeout(grace, &mut server).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Ok(()),
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "drain period elapsed, aborting server"
                );
                server.abort();
                Ok(())
            }
        }
    }
}
