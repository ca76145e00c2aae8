//! HTTP server for a bound route tree.
//!
//! # Responsibilities
//! - Wrap the bound router with request tracing
//! - Serve it on a listener until shutdown is signalled

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::lifecycle::ShutdownSignal;

/// Serves the axum router produced by an `AxumBinder`.
pub struct RouteServer {
    router: Router,
}

impl RouteServer {
    /// Create a server for `router`.
    pub fn new(router: Router) -> Self {
        Self {
            router: router.layer(TraceLayer::new_for_http()),
        }
    }

    /// The router with middleware applied, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until shutdown is triggered.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
