//! # Pinpoint Relay
//!
//! The local agent relay: an HTTP server that accepts structured prompts
//! from the browser overlay, spawns the external coding-agent process per
//! request, and republishes its progress as Server-Sent Events - plus the
//! client used to talk to that server.
//!
//! The relay never retries a failed agent invocation and enforces no
//! timeout: a hung agent process hangs its stream, by design, and closing
//! the browser connection does not kill the agent.

pub mod agent;
pub mod client;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
mod sse;

pub use agent::AgentCommand;
pub use client::{RelayClient, RelayOutcome};
pub use error::RelayError;
pub use routes::router;
pub use server::RelayServer;
