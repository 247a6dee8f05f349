//! External agent process execution.
//!
//! Each `/execute` request spawns its own agent process and owns its
//! pipes exclusively. The prompt is written to stdin, never passed as a
//! command-line argument, so no shell escaping can mangle it. Stdout is
//! the agent's structured `stream-json` output: one JSON object per line,
//! mapped to [`AgentEvent`]s; anything that does not parse is a
//! diagnostic and is silently dropped.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pinpoint_config::AgentSettings;
use pinpoint_protocols::AgentEvent;

use crate::error::RelayError;

/// Detail strings forwarded to the browser are clipped to this length.
const DETAIL_CHARS: usize = 150;

/// How much of the stderr tail is surfaced on failure.
const STDERR_TAIL_CHARS: usize = 500;

/// A resolved agent invocation: program plus fixed arguments.
#[derive(Debug, Clone)]
pub struct AgentCommand {
    pub program: String,
    pub args: Vec<String>,
    workspace_flag: Option<&'static str>,
}

impl AgentCommand {
    /// Resolve the spawn recipe for the configured agent kind.
    ///
    /// `cursor` uses Cursor's built-in agent CLI. `custom` runs
    /// `agent.program` with `agent.extra_args` verbatim, for agents we
    /// have no recipe for.
    pub fn resolve(settings: &AgentSettings) -> Result<Self, RelayError> {
        match settings.kind.as_str() {
            "cursor" => {
                let mut args: Vec<String> = [
                    "agent",
                    "--print",
                    "--output-format",
                    "stream-json",
                    "--force",
                ]
                .iter()
                .map(|s| s.to_string())
                .collect();
                args.extend(settings.extra_args.iter().cloned());
                Ok(Self {
                    program: settings
                        .program
                        .clone()
                        .unwrap_or_else(|| "cursor".to_string()),
                    args,
                    workspace_flag: Some("--workspace"),
                })
            }
            "custom" => {
                let program = settings.program.clone().ok_or_else(|| {
                    RelayError::UnsupportedAgent(
                        "custom agent kind requires agent.program".to_string(),
                    )
                })?;
                Ok(Self {
                    program,
                    args: settings.extra_args.clone(),
                    workspace_flag: None,
                })
            }
            other => Err(RelayError::UnsupportedAgent(other.to_string())),
        }
    }

    /// Best-effort discovery probe for the agent program.
    pub fn is_available(&self) -> bool {
        which::which(&self.program).is_ok()
    }
}

/// Run one agent execution, publishing progress on `events`.
///
/// Emits exactly one terminal event per run: an `Error` mapped from the
/// agent's own result stream, or else `Done`/`Error` derived from the
/// exit status. Never retries. A dropped receiver (client went away)
/// does not stop the process; remaining events are swallowed.
pub async fn execute_streaming(
    command: AgentCommand,
    prompt: String,
    workspace: Option<PathBuf>,
    events: mpsc::Sender<AgentEvent>,
) {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);
    if let Some(flag) = command.workspace_flag {
        let dir = workspace
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        cmd.arg(flag).arg(dir);
    }
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!(program = %command.program, args = ?command.args, prompt_len = prompt.len(), "spawning agent");

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            let message = if err.kind() == std::io::ErrorKind::NotFound {
                format!(
                    "{program} not found. Make sure the agent CLI is installed and \
                     '{program}' is in your PATH. Run: pinpoint check",
                    program = command.program
                )
            } else {
                format!("Failed to start {}: {}", command.program, err)
            };
            send(&events, AgentEvent::error(message)).await;
            return;
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(err) = stdin.write_all(prompt.as_bytes()).await {
            warn!(error = %err, "failed to write prompt to agent stdin");
        }
        // Dropping closes the pipe so the agent sees EOF.
    }

    let stderr_task = child.stderr.take().map(|stderr| {
        tokio::spawn(async move {
            let mut buf = String::new();
            let _ = BufReader::new(stderr).read_to_string(&mut buf).await;
            buf
        })
    });

    let mut terminal_sent = false;
    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(event) = map_process_line(&line) {
                terminal_sent |= event.is_terminal();
                send(&events, event).await;
            }
        }
    }

    let status = child.wait().await;
    let stderr_tail = match stderr_task {
        Some(task) => tail(&task.await.unwrap_or_default(), STDERR_TAIL_CHARS),
        None => String::new(),
    };

    if terminal_sent {
        // The result stream already settled this run; the exit status is
        // only of diagnostic interest.
        debug!(?status, "agent exited after a terminal result event");
        return;
    }

    match status {
        Ok(status) if status.success() => {
            info!("agent execution completed");
            send(&events, AgentEvent::done(None)).await;
        }
        Ok(status) => {
            warn!(?status, "agent execution failed");
            send(
                &events,
                AgentEvent::error(exit_error_message(status.code(), &stderr_tail)),
            )
            .await;
        }
        Err(err) => {
            send(
                &events,
                AgentEvent::error(format!("Failed to wait for agent: {err}")),
            )
            .await;
        }
    }
}

/// Spawn an execution detached from any response, logging its outcome.
pub fn execute_detached(command: AgentCommand, prompt: String, workspace: Option<PathBuf>) {
    let (tx, mut rx) = mpsc::channel(16);
    tokio::spawn(execute_streaming(command, prompt, workspace, tx));
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                AgentEvent::Error { message } => {
                    warn!(%message, "detached agent execution failed")
                }
                AgentEvent::Done { .. } => info!("detached agent execution completed"),
                AgentEvent::Status { message, .. } => {
                    debug!(%message, "detached agent progress")
                }
            }
        }
    });
}

async fn send(events: &mpsc::Sender<AgentEvent>, event: AgentEvent) {
    if events.send(event).await.is_err() {
        // Receiver dropped: the client disconnected. The process keeps
        // running; its remaining output is swallowed.
        debug!("event receiver dropped, swallowing agent output");
    }
}

/// Map one line of the agent's `stream-json` output to a relay event.
///
/// Lines that are not JSON objects are interleaved diagnostics and map to
/// `None`.
pub(crate) fn map_process_line(line: &str) -> Option<AgentEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(trimmed).ok()?;
    let obj = value.as_object()?;

    match obj.get("type").and_then(|t| t.as_str())? {
        "system" => {
            if obj.get("subtype").and_then(|s| s.as_str()) == Some("init") {
                Some(AgentEvent::status("Initializing agent..."))
            } else {
                None
            }
        }
        "thinking" => {
            let text = ["content", "text", "message"]
                .iter()
                .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
                .unwrap_or("");
            let completed = obj.get("subtype").and_then(|s| s.as_str()) == Some("completed");
            if completed || !text.is_empty() {
                Some(AgentEvent::Status {
                    message: "Thinking...".to_string(),
                    detail: (!text.is_empty()).then(|| clip(text, DETAIL_CHARS)),
                })
            } else {
                None
            }
        }
        "assistant" => {
            let text = obj
                .get("message")?
                .get("content")?
                .as_array()?
                .iter()
                .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join(" ");
            (!text.is_empty())
                .then(|| AgentEvent::status_with_detail("Agent working...", clip(&text, DETAIL_CHARS)))
        }
        "result" => {
            let subtype = obj.get("subtype").and_then(|s| s.as_str());
            let is_error = obj
                .get("is_error")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            let result = obj.get("result").and_then(|r| r.as_str());
            match subtype {
                Some("success") => Some(match result {
                    Some(result) => {
                        AgentEvent::status_with_detail("Completed successfully!", result)
                    }
                    None => AgentEvent::status("Completed successfully!"),
                }),
                Some("error") => Some(AgentEvent::error(result.unwrap_or("Unknown error"))),
                _ if is_error => Some(AgentEvent::error(result.unwrap_or("Unknown error"))),
                _ => Some(AgentEvent::status("Task finished")),
            }
        }
        _ => None,
    }
}

fn exit_error_message(code: Option<i32>, stderr_tail: &str) -> String {
    if stderr_tail.contains("Authentication required") || stderr_tail.contains("CURSOR_API_KEY") {
        return "Authentication required. Set the CURSOR_API_KEY environment variable or run: \
                cursor agent login. Run: pinpoint check for help."
            .to_string();
    }
    let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
    if stderr_tail.is_empty() {
        format!("Agent exited with code {code}")
    } else {
        format!("Agent exited with code {code}. {stderr_tail}")
    }
}

/// First `max` characters.
fn clip(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Last `max` characters, trimmed.
fn tail(text: &str, max: usize) -> String {
    let count = text.chars().count();
    let skipped: String = text.chars().skip(count.saturating_sub(max)).collect();
    skipped.trim().to_string()
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
