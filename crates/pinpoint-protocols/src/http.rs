//! HTTP request and response bodies for the relay endpoints.

use serde::{Deserialize, Serialize};

/// Body of `POST /execute`.
///
/// `prompt` is optional here so the server can answer a missing field with
/// its own 400 body instead of a framework rejection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub workspace_path: Option<String>,
}

/// Fire-and-forget acknowledgment for a non-streaming `POST /execute`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteAck {
    pub success: bool,
    pub message: String,
    pub agent_type: String,
}

/// Error body for 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: String,
    pub agent_type: String,
    pub agent_available: bool,
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_request_tolerates_missing_fields() {
        let req: ExecuteRequest = serde_json::from_str("{}").unwrap();
        assert!(req.prompt.is_none());
        assert!(req.workspace_path.is_none());
    }

    #[test]
    fn execute_request_uses_camel_case() {
        let req: ExecuteRequest =
            serde_json::from_str(r#"{"prompt":"p","workspacePath":"/w"}"#).unwrap();
        assert_eq!(req.prompt.as_deref(), Some("p"));
        assert_eq!(req.workspace_path.as_deref(), Some("/w"));
    }

    #[test]
    fn health_status_wire_shape() {
        let health = HealthStatus {
            status: "ok".to_string(),
            agent_type: "cursor".to_string(),
            agent_available: true,
            port: 5567,
        };
        let json = serde_json::to_string(&health).unwrap();
        assert_eq!(
            json,
            r#"{"status":"ok","agentType":"cursor","agentAvailable":true,"port":5567}"#
        );
    }
}
