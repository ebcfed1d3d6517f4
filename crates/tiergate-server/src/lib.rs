//! HTTP server assembly for tiergate

use std::net::SocketAddr;

use axum::Router;
use tiergate_config::Config;
use tiergate_llm::LlmState;
use tiergate_telemetry::RoutingTelemetry;
use tower_http::trace::TraceLayer;

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
    telemetry: RoutingTelemetry,
}

impl Server {
    /// Build the server from configuration
    ///
    /// Spawns the routing log writer, so it must be called within a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if a duration is invalid or a tier backend cannot
    /// be constructed
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let listen_address = config
            .server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

        let telemetry = RoutingTelemetry::from_config(&config.telemetry)?;
        let llm_state = LlmState::from_config(config, telemetry.clone())?;

        let mut app = Router::new();

        if config.server.health.enabled {
            app = app.route(&config.server.health.path, axum::routing::get(health));
        }

        app = app.merge(tiergate_llm::llm_router(llm_state));
        app = app.layer(TraceLayer::new_for_http());

        Ok(Self {
            router: app,
            listen_address,
            telemetry,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Routing telemetry shared with the request handlers
    #[must_use]
    pub const fn telemetry(&self) -> &RoutingTelemetry {
        &self.telemetry
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered, then waits for
    /// pending routing log writes.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.cancelled().await;
                tracing::info!("graceful shutdown initiated");
            })
            .await?;

        self.telemetry.flush().await;
        Ok(())
    }
}

async fn health() -> &'static str {
    "ok"
}
