use tokio::sync::mpsc;

use pinpoint_config::AgentSettings;
use pinpoint_protocols::AgentEvent;

use super::*;

fn sh_settings(script: &str) -> AgentSettings {
    AgentSettings {
        kind: "custom".to_string(),
        program: Some("/bin/sh".to_string()),
        extra_args: vec!["-c".to_string(), script.to_string()],
        workspace: None,
    }
}

async fn run_script(script: &str, prompt: &str) -> Vec<AgentEvent> {
    let command = AgentCommand::resolve(&sh_settings(script)).unwrap();
    let (tx, mut rx) = mpsc::channel(16);
    let runner = tokio::spawn(execute_streaming(
        command,
        prompt.to_string(),
        None,
        tx,
    ));

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    runner.await.unwrap();
    events
}

fn terminal_count(events: &[AgentEvent]) -> usize {
    events.iter().filter(|e| e.is_terminal()).count()
}

// ---------------------------------------------------------------------
// Command resolution
// ---------------------------------------------------------------------

#[test]
fn cursor_kind_resolves_the_builtin_recipe() {
    let settings = AgentSettings::default();
    let command = AgentCommand::resolve(&settings).unwrap();
    assert_eq!(command.program, "cursor");
    assert_eq!(
        command.args,
        vec!["agent", "--print", "--output-format", "stream-json", "--force"]
    );
}

#[test]
fn cursor_extra_args_are_appended() {
    let settings = AgentSettings {
        extra_args: vec!["--model".to_string(), "fast".to_string()],
        ..AgentSettings::default()
    };
    let command = AgentCommand::resolve(&settings).unwrap();
    assert!(command.args.ends_with(&["--model".to_string(), "fast".to_string()]));
}

#[test]
fn custom_kind_requires_a_program() {
    let settings = AgentSettings {
        kind: "custom".to_string(),
        ..AgentSettings::default()
    };
    assert!(matches!(
        AgentCommand::resolve(&settings),
        Err(RelayError::UnsupportedAgent(_))
    ));
}

#[test]
fn unknown_kind_is_rejected() {
    let settings = AgentSettings {
        kind: "copilot".to_string(),
        ..AgentSettings::default()
    };
    assert!(matches!(
        AgentCommand::resolve(&settings),
        Err(RelayError::UnsupportedAgent(_))
    ));
}

#[test]
fn availability_probe_finds_sh() {
    let command = AgentCommand::resolve(&sh_settings("true")).unwrap();
    assert!(command.is_available());

    let settings = AgentSettings {
        kind: "custom".to_string(),
        program: Some("pinpoint-definitely-missing-agent".to_string()),
        extra_args: vec![],
        workspace: None,
    };
    let command = AgentCommand::resolve(&settings).unwrap();
    assert!(!command.is_available());
}

// ---------------------------------------------------------------------
// Stream-json mapping
// ---------------------------------------------------------------------

#[test]
fn init_maps_to_initializing() {
    let event = map_process_line(r#"{"type":"system","subtype":"init"}"#).unwrap();
    assert_eq!(event, AgentEvent::status("Initializing agent..."));

    assert!(map_process_line(r#"{"type":"system","subtype":"other"}"#).is_none());
}

#[test]
fn thinking_carries_clipped_detail() {
    let long = "x".repeat(200);
    let line = format!(r#"{{"type":"thinking","content":"{long}"}}"#);
    match map_process_line(&line).unwrap() {
        AgentEvent::Status { message, detail } => {
            assert_eq!(message, "Thinking...");
            assert_eq!(detail.unwrap().len(), 150);
        }
        other => panic!("expected status, got {other:?}"),
    }

    // Completed thinking without text still reports progress.
    let event = map_process_line(r#"{"type":"thinking","subtype":"completed"}"#).unwrap();
    assert_eq!(
        event,
        AgentEvent::Status {
            message: "Thinking...".to_string(),
            detail: None
        }
    );

    // Thinking with neither text nor completion is noise.
    assert!(map_process_line(r#"{"type":"thinking"}"#).is_none());
}

#[test]
fn assistant_text_blocks_are_joined() {
    let line = r#"{"type":"assistant","message":{"content":[
        {"type":"text","text":"editing"},
        {"type":"tool_use","name":"write"},
        {"type":"text","text":"App.jsx"}
    ]}}"#;
    let event = map_process_line(&line.replace('\n', "")).unwrap();
    assert_eq!(
        event,
        AgentEvent::status_with_detail("Agent working...", "editing App.jsx")
    );

    assert!(
        map_process_line(r#"{"type":"assistant","message":{"content":[]}}"#).is_none()
    );
}

#[test]
fn result_subtypes_map_to_status_error_or_finish() {
    let event =
        map_process_line(r#"{"type":"result","subtype":"success","result":"ok"}"#).unwrap();
    assert_eq!(
        event,
        AgentEvent::status_with_detail("Completed successfully!", "ok")
    );

    let event = map_process_line(r#"{"type":"result","subtype":"error","result":"bad"}"#).unwrap();
    assert_eq!(event, AgentEvent::error("bad"));

    let event = map_process_line(r#"{"type":"result","is_error":true}"#).unwrap();
    assert_eq!(event, AgentEvent::error("Unknown error"));

    let event = map_process_line(r#"{"type":"result","subtype":"cancelled"}"#).unwrap();
    assert_eq!(event, AgentEvent::status("Task finished"));
}

#[test]
fn non_json_diagnostics_are_dropped() {
    assert!(map_process_line("npm WARN deprecated something").is_none());
    assert!(map_process_line("").is_none());
    assert!(map_process_line("[1,2,3]").is_none());
    assert!(map_process_line(r#"{"no_type":true}"#).is_none());
    assert!(map_process_line(r#"{"type":"unknown_kind"}"#).is_none());
}

// ---------------------------------------------------------------------
// Process execution
// ---------------------------------------------------------------------

#[tokio::test]
async fn successful_run_ends_with_exactly_one_done() {
    let events = run_script(
        r#"cat >/dev/null; printf '{"type":"result","subtype":"success","result":"ok"}\n'"#,
        "prompt",
    )
    .await;

    assert_eq!(
        events,
        vec![
            AgentEvent::status_with_detail("Completed successfully!", "ok"),
            AgentEvent::done(None),
        ]
    );
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn prompt_reaches_the_agent_via_stdin() {
    let events = run_script(
        r#"read first rest; printf '{"type":"result","subtype":"success","result":"%s"}\n' "$first""#,
        "hello world",
    )
    .await;

    assert!(events.contains(&AgentEvent::status_with_detail(
        "Completed successfully!",
        "hello"
    )));
}

#[tokio::test]
async fn result_error_suppresses_the_trailing_done() {
    let events = run_script(
        r#"cat >/dev/null; printf '{"type":"result","subtype":"error","result":"bad"}\n'"#,
        "prompt",
    )
    .await;

    assert_eq!(events, vec![AgentEvent::error("bad")]);
    assert_eq!(terminal_count(&events), 1);
}

#[tokio::test]
async fn nonzero_exit_surfaces_the_stderr_tail() {
    let events = run_script(r#"cat >/dev/null; echo boom >&2; exit 3"#, "prompt").await;

    assert_eq!(events.len(), 1);
    match &events[0] {
        AgentEvent::Error { message } => {
            assert!(message.contains("code 3"), "got: {message}");
            assert!(message.contains("boom"), "got: {message}");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn auth_failures_get_a_remediation_message() {
    let events = run_script(
        r#"cat >/dev/null; echo 'Authentication required to continue' >&2; exit 1"#,
        "prompt",
    )
    .await;

    match &events[0] {
        AgentEvent::Error { message } => {
            assert!(message.contains("CURSOR_API_KEY"), "got: {message}");
            assert!(message.contains("cursor agent login"), "got: {message}");
        }
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_program_reports_install_guidance() {
    let settings = AgentSettings {
        kind: "custom".to_string(),
        program: Some("/nonexistent/pinpoint-test-agent".to_string()),
        extra_args: vec![],
        workspace: None,
    };
    let command = AgentCommand::resolve(&settings).unwrap();
    let (tx, mut rx) = mpsc::channel(16);
    execute_streaming(command, "prompt".to_string(), None, tx).await;

    let event = rx.recv().await.unwrap();
    match event {
        AgentEvent::Error { message } => {
            assert!(message.contains("PATH"), "got: {message}");
            assert!(message.contains("pinpoint check"), "got: {message}");
        }
        other => panic!("expected error, got {other:?}"),
    }
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn interleaved_diagnostics_are_ignored() {
    let script = r#"cat >/dev/null
printf 'npm WARN something\n'
printf '{"type":"system","subtype":"init"}\n'
printf 'plain diagnostic line\n'
printf '{"type":"result","subtype":"success"}\n'"#;
    let events = run_script(script, "prompt").await;

    assert_eq!(
        events,
        vec![
            AgentEvent::status("Initializing agent..."),
            AgentEvent::status("Completed successfully!"),
            AgentEvent::done(None),
        ]
    );
}

// ---------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------

#[test]
fn tail_keeps_the_last_characters() {
    assert_eq!(tail("abcdef", 3), "def");
    assert_eq!(tail("ab", 3), "ab");
    assert_eq!(tail("  padded  ", 20), "padded");
}

#[test]
fn clip_keeps_the_first_characters() {
    assert_eq!(clip("abcdef", 3), "abc");
    assert_eq!(clip("ab", 3), "ab");
}
