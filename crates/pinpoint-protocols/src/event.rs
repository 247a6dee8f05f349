//! Agent progress events.
//!
//! One `AgentEvent` is the unit of progress the relay server republishes
//! to browsers, framed as a Server-Sent Events `data:` line.

use serde::{Deserialize, Serialize};

/// Prefix of an SSE data line.
pub const SSE_DATA_PREFIX: &str = "data: ";

/// A progress event emitted by the relay for one agent execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// Informational progress update.
    Status {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },

    /// Execution failed. Terminal.
    Error { message: String },

    /// Execution finished. Terminal.
    #[serde(rename_all = "camelCase")]
    Done {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result_summary: Option<String>,
    },
}

impl AgentEvent {
    /// Create a status event without detail.
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
            detail: None,
        }
    }

    /// Create a status event with detail.
    pub fn status_with_detail(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
            detail: Some(detail.into()),
        }
    }

    /// Create an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Create a successful done event.
    pub fn done(result_summary: Option<String>) -> Self {
        Self::Done {
            success: true,
            result_summary,
        }
    }

    /// Whether this event terminates a stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Done { .. })
    }
}

/// Frame an event as one SSE message: `data: <JSON>\n\n`.
pub fn sse_frame(event: &AgentEvent) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(event)?;
    Ok(format!("{SSE_DATA_PREFIX}{json}\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_type_tag() {
        let event = AgentEvent::status("Starting agent...");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"status","message":"Starting agent..."}"#);
    }

    #[test]
    fn status_detail_is_absent_when_none() {
        let json = serde_json::to_string(&AgentEvent::status("x")).unwrap();
        assert!(!json.contains("detail"));
    }

    #[test]
    fn done_round_trips() {
        let event = AgentEvent::done(Some("edited 2 files".to_string()));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"done""#));
        assert!(json.contains(r#""resultSummary":"edited 2 files""#));

        let parsed: AgentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let parsed: AgentEvent =
            serde_json::from_str(r#"{"type":"done","success":true,"code":0,"stdout":""}"#).unwrap();
        assert!(matches!(parsed, AgentEvent::Done { success: true, .. }));
    }

    #[test]
    fn terminal_classification() {
        assert!(!AgentEvent::status("x").is_terminal());
        assert!(AgentEvent::error("boom").is_terminal());
        assert!(AgentEvent::done(None).is_terminal());
    }

    #[test]
    fn sse_frame_format() {
        let frame = sse_frame(&AgentEvent::error("bad")).unwrap();
        assert_eq!(frame, "data: {\"type\":\"error\",\"message\":\"bad\"}\n\n");
    }
}
