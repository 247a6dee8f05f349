//! Relay HTTP handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::info;

use pinpoint_config::Config;
use pinpoint_protocols::{AgentEvent, ErrorBody, ExecuteAck, ExecuteRequest, HealthStatus};

use crate::agent::{self, AgentCommand};
use crate::sse::{sse_body_stream, sse_response};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

/// Query parameters of `POST /execute`.
#[derive(Debug, Deserialize)]
pub struct ExecuteQuery {
    #[serde(default)]
    stream: Option<String>,
}

/// `GET /health`.
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    let agent_available = AgentCommand::resolve(&state.config.agent)
        .map(|command| command.is_available())
        .unwrap_or(false);
    Json(HealthStatus {
        status: "ok".to_string(),
        agent_type: state.config.agent.kind.clone(),
        agent_available,
        port: state.config.server.port,
    })
}

/// `POST /execute`, optionally `?stream=true` or `Accept: text/event-stream`.
///
/// The streaming path answers with an SSE body fed by the agent process;
/// the fire-and-forget path acknowledges immediately and logs the outcome
/// asynchronously. Concurrent requests each get their own process.
pub async fn execute(
    State(state): State<AppState>,
    Query(query): Query<ExecuteQuery>,
    headers: HeaderMap,
    Json(request): Json<ExecuteRequest>,
) -> Response {
    let Some(prompt) = request.prompt.filter(|p| !p.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Missing prompt parameter")),
        )
            .into_response();
    };

    let command = match AgentCommand::resolve(&state.config.agent) {
        Ok(command) => command,
        Err(err) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(err.to_string())),
            )
                .into_response();
        }
    };

    let workspace = request
        .workspace_path
        .map(PathBuf::from)
        .or_else(|| state.config.agent.workspace.clone());

    if wants_streaming(&query, &headers) {
        info!(prompt_len = prompt.len(), "streaming agent execution");
        let (tx, rx) = mpsc::channel::<AgentEvent>(16);
        // Queued before the spawn so it is always the first frame.
        let _ = tx.send(AgentEvent::status("Starting agent...")).await;
        tokio::spawn(agent::execute_streaming(command, prompt, workspace, tx));
        sse_response(sse_body_stream(rx))
    } else {
        info!(prompt_len = prompt.len(), "detached agent execution");
        agent::execute_detached(command, prompt, workspace);
        Json(ExecuteAck {
            success: true,
            message: "Agent execution started".to_string(),
            agent_type: state.config.agent.kind.clone(),
        })
        .into_response()
    }
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(format!("Not found: {}", uri.path()))),
    )
}

fn wants_streaming(query: &ExecuteQuery, headers: &HeaderMap) -> bool {
    if query.stream.as_deref() == Some("true") {
        return true;
    }
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/event-stream"))
}
