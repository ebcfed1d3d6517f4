//! Test server wrapper that starts tiergate on a random port

use std::net::SocketAddr;

use tiergate_config::Config;
use tiergate_server::Server;
use tiergate_telemetry::RoutingTelemetry;
use tokio_util::sync::CancellationToken;

/// A running test server instance
pub struct TestServer {
    addr: SocketAddr,
    shutdown: CancellationToken,
    client: reqwest::Client,
    telemetry: RoutingTelemetry,
}

impl TestServer {
    /// Start a test server with the given configuration
    ///
    /// Binds to port 0 for automatic port assignment
    pub async fn start(config: Config) -> anyhow::Result<Self> {
        let server = Server::new(&config)?;
        let telemetry = server.telemetry().clone();
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        // Bind the listener here so we know the actual port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, server.into_router())
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            client: reqwest::Client::new(),
            telemetry,
        })
    }

    /// Base URL of the running test server
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// Get a reference to the HTTP client
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Wait until queued routing log lines are on disk
    pub async fn flush_log(&self) {
        self.telemetry.flush().await;
    }

    /// `POST /v1/chat/completions` with a JSON body
    pub async fn chat(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/v1/chat/completions"))
            .json(body)
            .send()
            .await
            .expect("request reaches the test server")
    }

    /// `GET /v1/stats` as JSON
    pub async fn stats(&self) -> serde_json::Value {
        self.client
            .get(self.url("/v1/stats"))
            .send()
            .await
            .expect("request reaches the test server")
            .json()
            .await
            .expect("stats are JSON")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
