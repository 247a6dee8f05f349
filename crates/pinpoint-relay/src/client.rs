//! Agent relay client.
//!
//! Talks to the relay server over HTTP: a health probe, a fire-and-forget
//! execute, and the streaming execute that feeds progress events back to
//! the selection machine. Failures are surfaced, never retried, and never
//! silently redirected to another sink.

use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::debug;

use pinpoint_protocols::{AgentEvent, ExecuteAck, ExecuteRequest, HealthStatus, SSE_DATA_PREFIX};

use crate::error::RelayError;

/// How a relayed execution concluded, from the client's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The stream ended after `Done`, or cleanly without an explicit one.
    Completed { summary: Option<String> },
    /// The server does not stream: execution started, outcome unknown.
    Started,
    /// The agent reported an error over the stream.
    Failed { message: String },
}

impl RelayOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RelayOutcome::Failed { .. })
    }
}

/// HTTP client for the local relay server.
pub struct RelayClient {
    base_url: String,
    http: reqwest::Client,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, RelayError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }
        Ok(response.json().await?)
    }

    /// `POST /execute?stream=true`, forwarding every streamed event to
    /// `on_event` until a terminal event or the end of the stream.
    pub async fn execute_streaming(
        &self,
        prompt: &str,
        workspace_path: Option<&str>,
        mut on_event: impl FnMut(AgentEvent),
    ) -> Result<RelayOutcome, RelayError> {
        let response = self
            .http
            .post(format!("{}/execute?stream=true", self.base_url))
            .header(ACCEPT, "text/event-stream")
            .json(&ExecuteRequest {
                prompt: Some(prompt.to_string()),
                workspace_path: workspace_path.map(str::to_string),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        let streaming = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/event-stream"));
        if !streaming {
            // A plain acknowledgment body: fire-and-forget semantics.
            let ack: ExecuteAck = response.json().await?;
            debug!(message = %ack.message, "relay acknowledged without streaming");
            return Ok(RelayOutcome::Started);
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            while let Some(newline) = buffer.find('\n') {
                let line: String = buffer.drain(..=newline).collect();
                let Some(event) = parse_sse_line(line.trim_end()) else {
                    continue;
                };
                let outcome = terminal_outcome(&event);
                on_event(event);
                if let Some(outcome) = outcome {
                    return Ok(outcome);
                }
            }
        }

        // Clean end of stream without an explicit Done counts as success.
        Ok(RelayOutcome::Completed { summary: None })
    }

    /// Plain `POST /execute`: start the agent and return immediately.
    pub async fn execute_detached(
        &self,
        prompt: &str,
        workspace_path: Option<&str>,
    ) -> Result<ExecuteAck, RelayError> {
        let response = self
            .http
            .post(format!("{}/execute", self.base_url))
            .json(&ExecuteRequest {
                prompt: Some(prompt.to_string()),
                workspace_path: workspace_path.map(str::to_string),
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn server_error(response: reqwest::Response) -> RelayError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        RelayError::Server { status, body }
    }
}

fn parse_sse_line(line: &str) -> Option<AgentEvent> {
    let data = line.strip_prefix(SSE_DATA_PREFIX)?;
    serde_json::from_str(data).ok()
}

fn terminal_outcome(event: &AgentEvent) -> Option<RelayOutcome> {
    match event {
        AgentEvent::Done {
            success: true,
            result_summary,
        } => Some(RelayOutcome::Completed {
            summary: result_summary.clone(),
        }),
        AgentEvent::Done {
            success: false,
            result_summary,
        } => Some(RelayOutcome::Failed {
            message: result_summary
                .clone()
                .unwrap_or_else(|| "Agent finished with errors".to_string()),
        }),
        AgentEvent::Error { message } => Some(RelayOutcome::Failed {
            message: message.clone(),
        }),
        AgentEvent::Status { .. } => None,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
