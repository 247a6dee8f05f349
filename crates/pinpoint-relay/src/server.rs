//! Relay server lifecycle.
//!
//! Bind on command, serve until SIGTERM/SIGINT, then shut down gracefully,
//! draining in-flight streamed responses instead of severing them.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use pinpoint_config::Config;

use crate::error::RelayError;
use crate::handlers::AppState;
use crate::routes::router;

/// The agent relay server.
pub struct RelayServer {
    config: Arc<Config>,
}

impl RelayServer {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// The address the server will bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }

    /// Run the server until a termination signal arrives.
    ///
    /// Binding an already-used port fails immediately with a clear error
    /// instead of fighting another instance for the socket.
    pub async fn run(&self) -> Result<(), RelayError> {
        let app = router(AppState::new(self.config.clone()));

        let addr = self.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayError::Bind {
                addr: addr.clone(),
                source,
            })?;

        info!("Relay server listening on {}", addr);
        info!("Agent type: {}", self.config.agent.kind);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Relay server stopped");
        Ok(())
    }
}

/// Resolve when the process is asked to terminate.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(err) => {
            tracing::error!(error = %err, "failed to install SIGTERM handler");
            std::future::pending().await
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down"),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down");
    }
}
