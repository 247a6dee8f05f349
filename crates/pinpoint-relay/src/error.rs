//! Relay error types.

use thiserror::Error;

/// Relay error types, covering both the server and the client side.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The configured agent kind has no spawn recipe.
    #[error("Unsupported agent kind: {0}")]
    UnsupportedAgent(String),

    /// The server could not bind its listening socket.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The relay answered with a non-2xx status.
    #[error("Relay server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// HTTP transport failure talking to the relay.
    #[error("Relay unreachable: {0}")]
    Request(#[from] reqwest::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
