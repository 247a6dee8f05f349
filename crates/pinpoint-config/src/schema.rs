//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub agent: AgentSettings,

    #[serde(default)]
    pub editor: EditorSettings,
}

/// Relay server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5567
}

/// External coding-agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Agent kind selector ("cursor" is the only built-in).
    #[serde(default = "default_agent_kind")]
    pub kind: String,

    /// Override for the agent program name looked up on PATH.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,

    /// Extra arguments appended to the agent invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Default workspace when a request carries none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            kind: default_agent_kind(),
            program: None,
            extra_args: Vec::new(),
            workspace: None,
        }
    }
}

fn default_agent_kind() -> String {
    "cursor".to_string()
}

/// Editor used for deep links and file opening.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditorSettings {
    #[serde(default)]
    pub kind: EditorKind,
}

/// Supported editor URL schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorKind {
    #[default]
    Cursor,
    Vscode,
}

impl EditorKind {
    /// URL scheme for this editor.
    pub fn scheme(&self) -> &'static str {
        match self {
            EditorKind::Cursor => "cursor",
            EditorKind::Vscode => "vscode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_relay() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5567);
        assert_eq!(config.agent.kind, "cursor");
        assert_eq!(config.editor.kind, EditorKind::Cursor);
    }

    #[test]
    fn editor_kind_deserializes_lowercase() {
        let editor: EditorSettings = toml::from_str("kind = \"vscode\"").unwrap();
        assert_eq!(editor.kind, EditorKind::Vscode);
        assert_eq!(editor.kind.scheme(), "vscode");
    }
}
