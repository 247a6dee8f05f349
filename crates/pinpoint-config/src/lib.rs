//! # Pinpoint Config
//!
//! Configuration management for the Pinpoint relay and CLI.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{AgentSettings, Config, EditorKind, EditorSettings, ServerSettings};

/// Environment variable overriding the relay port.
pub const ENV_AGENT_PORT: &str = "PINPOINT_AGENT_PORT";

/// Environment variable overriding the agent kind.
pub const ENV_AGENT_TYPE: &str = "PINPOINT_AGENT_TYPE";
