//! HTTP server owning the gateway routes and shared state.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::gateway;
use crate::orchestrator::WatchService;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Service that starts watches for accepted requests
    pub watcher: Arc<dyn WatchService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Wrap a watch service.
    #[must_use]
    pub fn new(watcher: Arc<dyn WatchService>) -> Self {
        Self { watcher }
    }
}

/// The watch gateway server.
#[derive(Debug)]
pub struct Server {
    addr: SocketAddr,
    state: AppState,
}

impl Server {
    /// Create a server that will listen on `addr`.
    #[must_use]
    pub fn new(addr: SocketAddr, watcher: Arc<dyn WatchService>) -> Self {
        Self {
            addr,
            state: AppState::new(watcher),
        }
    }

    /// Address the server listens on
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Full route table with tracing.
    pub fn router(&self) -> Router {
        gateway::routes()
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Serve until `shutdown` resolves.
    ///
    /// Requests in flight are allowed to finish. Watch loops already started
    /// are not affected.
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        info!("HTTP server listening on {}", listener.local_addr()?);

        axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;

        info!("HTTP server stopped");
        Ok(())
    }
}
