//! Selection interaction state machine.
//!
//! Owns the interaction mode (idle / previewing / locked-composing /
//! sending / result-shown) and the currently targeted element. Inputs are
//! plain method calls carrying an explicit `now`; outputs are mutations
//! through the [`HostAdapter`] plus [`Effect`] values the driver executes
//! (open a deep link, call the relay). The machine itself never performs
//! I/O, which keeps every transition testable without a host event loop.

use std::time::{Duration, Instant};

use tracing::debug;

use pinpoint_protocols::AgentEvent;

use crate::element::TargetedElement;
use crate::host::{HostAdapter, NodeId};
use crate::locate::{describe_target, locate, shallow_target};
use crate::prompt::{build, PromptPayload};

/// Trailing delay before rich element metadata is re-resolved.
pub const METADATA_DEBOUNCE: Duration = Duration::from_millis(50);

/// Minimum spacing between accepted metadata re-resolutions while the
/// pointer keeps moving.
pub const METADATA_THROTTLE: Duration = Duration::from_millis(100);

/// Cadence at which the embedder should call [`SelectionMachine::tick`]
/// while the machine is active.
pub const MAINTENANCE_INTERVAL: Duration = Duration::from_millis(100);

/// How long a successful result stays visible before auto-closing.
pub const SUCCESS_CLOSE_GRACE: Duration = Duration::from_millis(1500);

/// Which elements an edit request should apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Only the targeted element.
    #[default]
    OnlyThis,
    /// All elements similar to the targeted one.
    AllSimilar,
}

/// Where a submitted prompt goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Hand off via an editor deep link.
    DeepLink,
    /// Execute through the local agent relay.
    Relay,
}

/// Side effect for the driver to execute.
#[derive(Debug)]
pub enum Effect {
    /// Open the prompt as an editor deep link.
    OpenDeepLink { prompt: PromptPayload },
    /// Send the prompt to the relay server.
    RelayExecute { prompt: PromptPayload },
    /// Open the target's source file in the editor.
    OpenInEditor { file: String, line: u32 },
}

/// How a relay-backed send ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalOutcome {
    Success { summary: Option<String> },
    Error { message: String },
}

/// Compose lifecycle inside a locked selection.
#[derive(Debug, Clone)]
pub enum ComposePhase {
    /// Locked, label shown, not composing.
    Display,
    /// Text input focused, scope selectable.
    Editing,
    /// Request handed to the relay, no stream yet.
    Sending,
    /// Relay stream open; holds the latest progress event.
    Streaming { latest: AgentEvent },
    /// Finished. Success auto-closes at `close_at`; errors stay until the
    /// user dismisses or falls back to the deep link.
    Terminal {
        outcome: TerminalOutcome,
        close_at: Option<Instant>,
    },
}

/// Free text, scope, and phase of a locked compose session.
#[derive(Debug, Clone)]
pub struct ComposeState {
    pub text: String,
    pub scope: Scope,
    pub phase: ComposePhase,
}

impl ComposeState {
    fn editing() -> Self {
        Self {
            text: String::new(),
            scope: Scope::default(),
            phase: ComposePhase::Editing,
        }
    }

    fn is_running(&self) -> bool {
        matches!(
            self.phase,
            ComposePhase::Sending | ComposePhase::Streaming { .. }
        )
    }
}

/// Interaction mode plus the data each mode carries.
#[derive(Debug)]
pub enum InteractionState {
    Idle,
    Previewing { target: Option<TargetedElement> },
    Locked {
        target: TargetedElement,
        compose: ComposeState,
    },
}

/// Screen anchor and heading for the floating label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub x: f64,
    pub y: f64,
    pub heading: String,
    pub classes: String,
}

struct PendingRefresh {
    x: f64,
    y: f64,
    due: Instant,
}

/// The selection/compose state machine.
pub struct SelectionMachine {
    state: InteractionState,
    label: Option<LabelAnchor>,
    pending_refresh: Option<PendingRefresh>,
    last_refresh_accepted: Option<Instant>,
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self {
            state: InteractionState::Idle,
            label: None,
            pending_refresh: None,
            last_refresh_accepted: None,
        }
    }

    /// Current interaction state.
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// Current floating-label anchor, if a target is highlighted.
    pub fn label(&self) -> Option<&LabelAnchor> {
        self.label.as_ref()
    }

    /// Whether the maintenance tick should be running.
    pub fn is_active(&self) -> bool {
        !matches!(self.state, InteractionState::Idle)
    }

    /// The currently targeted element, previewing or locked.
    pub fn target(&self) -> Option<&TargetedElement> {
        match &self.state {
            InteractionState::Idle => None,
            InteractionState::Previewing { target } => target.as_ref(),
            InteractionState::Locked { target, .. } => Some(target),
        }
    }

    fn target_node(&self) -> Option<NodeId> {
        self.target().map(|t| t.node)
    }

    // ------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------

    /// Activation gesture pressed (e.g. the modifier key went down).
    ///
    /// Ignored unless idle and no other modifiers are held: a locked
    /// compose session refuses re-entry into previewing.
    pub fn activation_pressed(&mut self, other_modifiers: bool) {
        if other_modifiers {
            return;
        }
        if matches!(self.state, InteractionState::Idle) {
            debug!("entering preview mode");
            self.state = InteractionState::Previewing { target: None };
        }
    }

    /// Activation gesture released.
    pub fn activation_released(&mut self, host: &dyn HostAdapter) {
        if matches!(self.state, InteractionState::Previewing { .. }) {
            self.reset_to_idle(host);
        }
    }

    /// Escape. While editing text this only cancels the edit, keeping the
    /// lock; anywhere else it fully resets the interaction.
    pub fn escape(&mut self, host: &dyn HostAdapter) {
        match &mut self.state {
            InteractionState::Idle => {}
            InteractionState::Previewing { .. } => self.reset_to_idle(host),
            InteractionState::Locked { compose, .. } => {
                if matches!(compose.phase, ComposePhase::Editing) {
                    compose.text.clear();
                    compose.phase = ComposePhase::Display;
                } else {
                    self.reset_to_idle(host);
                }
            }
        }
    }

    /// Pointer motion while previewing.
    ///
    /// Retargets the highlight immediately; the richer descriptive fields
    /// refresh on a trailing debounce, throttled while motion continues.
    pub fn pointer_moved(&mut self, host: &dyn HostAdapter, x: f64, y: f64, now: Instant) {
        if !matches!(self.state, InteractionState::Previewing { .. }) {
            return;
        }
        let Some(node) = host.node_at(x, y) else {
            return;
        };
        // Hovering our own label keeps the current selection.
        if host.is_selection_label(node) {
            return;
        }
        // Hovering the overlay panel clears it.
        if host.is_overlay_chrome(node) {
            self.clear_target(host);
            return;
        }

        if self.target_node() != Some(node) {
            self.retarget(host, node);
        }

        // Coarse throttle on accepting a metadata refresh; each accepted
        // refresh trails the motion by the debounce delay.
        let accept = self
            .last_refresh_accepted
            .is_none_or(|t| now.duration_since(t) >= METADATA_THROTTLE);
        if accept {
            self.last_refresh_accepted = Some(now);
            self.pending_refresh = Some(PendingRefresh {
                x,
                y,
                due: now + METADATA_DEBOUNCE,
            });
        }
    }

    /// A click at `(x, y)`.
    ///
    /// While previewing, a click on a target with a known source location
    /// commits the selection into a locked compose session. While locked,
    /// a click outside both the label and the panel resets everything.
    pub fn click(&mut self, host: &dyn HostAdapter, x: f64, y: f64) {
        let node = host.node_at(x, y);
        match &self.state {
            InteractionState::Idle => {}
            InteractionState::Locked { .. } => {
                let on_chrome = node.is_some_and(|n| {
                    host.is_selection_label(n) || host.is_overlay_chrome(n)
                });
                if !on_chrome {
                    self.reset_to_idle(host);
                }
            }
            InteractionState::Previewing { .. } => {
                let Some(node) = node else { return };
                if host.is_selection_label(node) || host.is_overlay_chrome(node) {
                    return;
                }
                // Don't intercept clicks on interactive controls.
                if host
                    .describe(node)
                    .is_some_and(|d| d.tag_name.eq_ignore_ascii_case("button"))
                {
                    return;
                }
                let Some(current) = self.target_node() else {
                    return;
                };
                // Upgrade to full metadata before deciding whether there
                // is a source location to anchor an edit to.
                let Some(full) = describe_target(host, current) else {
                    return;
                };
                if full.source_location.is_some() {
                    self.lock(full);
                }
            }
        }
    }

    /// Explicit "compose" affordance.
    pub fn start_compose(&mut self, host: &dyn HostAdapter) {
        match &mut self.state {
            InteractionState::Locked { compose, .. } => {
                if matches!(compose.phase, ComposePhase::Display) {
                    compose.phase = ComposePhase::Editing;
                }
            }
            InteractionState::Previewing { .. } => {
                let Some(current) = self.target_node() else {
                    return;
                };
                let Some(full) = describe_target(host, current) else {
                    return;
                };
                if full.source_location.is_some() {
                    self.lock(full);
                }
            }
            InteractionState::Idle => {}
        }
    }

    /// Replace the compose text. Editing phase only.
    pub fn set_compose_text(&mut self, text: impl Into<String>) {
        if let InteractionState::Locked { compose, .. } = &mut self.state {
            if matches!(compose.phase, ComposePhase::Editing) {
                compose.text = text.into();
            }
        }
    }

    /// Change the scope selection. Editing phase only.
    pub fn set_scope(&mut self, scope: Scope) {
        if let InteractionState::Locked { compose, .. } = &mut self.state {
            if matches!(compose.phase, ComposePhase::Editing) {
                compose.scope = scope;
            }
        }
    }

    /// "Open in editor" affordance for the current target.
    pub fn open_in_editor(&self) -> Option<Effect> {
        let location = self.target()?.source_location.as_ref()?;
        Some(Effect::OpenInEditor {
            file: location.file.clone(),
            line: location.line_or_default(),
        })
    }

    /// Submit gesture (Enter without Shift, or the send button).
    ///
    /// Builds the prompt and either opens it as a deep link (which ends
    /// the session) or hands it to the relay (which enters `Sending`).
    /// Ignored while a send is already running.
    pub fn submit(&mut self, host: &dyn HostAdapter, mode: DispatchMode) -> Vec<Effect> {
        let InteractionState::Locked { target, compose } = &mut self.state else {
            return Vec::new();
        };
        if compose.is_running() {
            return Vec::new();
        }
        let Some(prompt) = build(target, &compose.text, compose.scope) else {
            // Locking requires a source location, but the node may have
            // been re-rendered out from under us.
            return Vec::new();
        };
        match mode {
            DispatchMode::DeepLink => {
                self.reset_to_idle(host);
                vec![Effect::OpenDeepLink { prompt }]
            }
            DispatchMode::Relay => {
                debug!(component = %prompt.component_name, "sending prompt to relay");
                compose.phase = ComposePhase::Sending;
                vec![Effect::RelayExecute { prompt }]
            }
        }
    }

    // ------------------------------------------------------------------
    // Relay feedback
    // ------------------------------------------------------------------

    /// The relay accepted the request and opened a stream.
    pub fn relay_accepted(&mut self) {
        if let InteractionState::Locked { compose, .. } = &mut self.state {
            if matches!(compose.phase, ComposePhase::Sending) {
                compose.phase = ComposePhase::Streaming {
                    latest: AgentEvent::status("Starting agent..."),
                };
            }
        }
    }

    /// A progress event arrived from the relay stream.
    pub fn relay_event(&mut self, event: AgentEvent, now: Instant) {
        let InteractionState::Locked { compose, .. } = &mut self.state else {
            return;
        };
        if !compose.is_running() {
            return;
        }
        match event {
            AgentEvent::Status { .. } => {
                compose.phase = ComposePhase::Streaming { latest: event };
            }
            AgentEvent::Error { message } => {
                compose.phase = ComposePhase::Terminal {
                    outcome: TerminalOutcome::Error { message },
                    close_at: None,
                };
            }
            AgentEvent::Done {
                success,
                result_summary,
            } => {
                compose.phase = if success {
                    ComposePhase::Terminal {
                        outcome: TerminalOutcome::Success {
                            summary: result_summary,
                        },
                        close_at: Some(now + SUCCESS_CLOSE_GRACE),
                    }
                } else {
                    ComposePhase::Terminal {
                        outcome: TerminalOutcome::Error {
                            message: result_summary
                                .unwrap_or_else(|| "Agent finished with errors".to_string()),
                        },
                        close_at: None,
                    }
                };
            }
        }
    }

    /// The relay call itself failed (non-2xx, transport error). No
    /// automatic retry; the error stays visible until dismissed.
    pub fn relay_failed(&mut self, message: impl Into<String>) {
        if let InteractionState::Locked { compose, .. } = &mut self.state {
            if compose.is_running() {
                compose.phase = ComposePhase::Terminal {
                    outcome: TerminalOutcome::Error {
                        message: message.into(),
                    },
                    close_at: None,
                };
            }
        }
    }

    /// Explicit dismiss of a locked session.
    pub fn dismiss(&mut self, host: &dyn HostAdapter) {
        if matches!(self.state, InteractionState::Locked { .. }) {
            self.reset_to_idle(host);
        }
    }

    /// After a relay failure, hand the same prompt to the deep-link sink.
    pub fn fallback_to_deep_link(&mut self, host: &dyn HostAdapter) -> Vec<Effect> {
        let InteractionState::Locked { target, compose } = &self.state else {
            return Vec::new();
        };
        if !matches!(
            compose.phase,
            ComposePhase::Terminal {
                outcome: TerminalOutcome::Error { .. },
                ..
            }
        ) {
            return Vec::new();
        }
        let Some(prompt) = build(target, &compose.text, compose.scope) else {
            return Vec::new();
        };
        self.reset_to_idle(host);
        vec![Effect::OpenDeepLink { prompt }]
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Periodic maintenance, expected roughly every
    /// [`MAINTENANCE_INTERVAL`] while [`Self::is_active`].
    ///
    /// Runs the trailing metadata refresh, re-asserts the highlight
    /// marker when an external re-render stripped it, follows the target
    /// geometry for the label, and auto-closes a successful result after
    /// its grace delay. Idempotent when nothing is targeted.
    pub fn tick(&mut self, host: &dyn HostAdapter, now: Instant) {
        // Trailing metadata refresh.
        if let Some(pending) = &self.pending_refresh {
            if pending.due <= now {
                let (x, y) = (pending.x, pending.y);
                self.pending_refresh = None;
                self.refresh_metadata(host, x, y);
            }
        }

        // Marker re-assertion and label position.
        if let Some(node) = self.target_node() {
            if !host.has_marker(node) {
                host.set_marker(node);
            }
            self.update_label(host);
        }

        // Auto-close a successful terminal state.
        if let InteractionState::Locked { compose, .. } = &self.state {
            if let ComposePhase::Terminal {
                close_at: Some(at), ..
            } = compose.phase
            {
                if at <= now {
                    self.reset_to_idle(host);
                }
            }
        }
    }

    /// Host-driven marker re-assertion for embedders with mutation
    /// observation; the polling in [`Self::tick`] remains the fallback.
    pub fn notify_marker_lost(&mut self, host: &dyn HostAdapter) {
        if let Some(node) = self.target_node() {
            if !host.has_marker(node) {
                host.set_marker(node);
            }
        }
    }

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------

    fn refresh_metadata(&mut self, host: &dyn HostAdapter, x: f64, y: f64) {
        let InteractionState::Previewing { target } = &mut self.state else {
            return;
        };
        let Some(full) = locate(host, x, y) else {
            return;
        };
        // Only upgrade the element the highlight is on; a stale refresh
        // for a node the pointer already left is dropped.
        if target.as_ref().map(|t| t.node) == Some(full.node) {
            *target = Some(full);
            self.update_label(host);
        }
    }

    fn retarget(&mut self, host: &dyn HostAdapter, node: NodeId) {
        if let Some(old) = self.target_node() {
            host.clear_marker(old);
        }
        let shallow = shallow_target(host, node);
        if let InteractionState::Previewing { target } = &mut self.state {
            *target = shallow;
        }
        if self.target_node().is_some() {
            host.set_marker(node);
            self.update_label(host);
        } else {
            self.label = None;
        }
    }

    fn clear_target(&mut self, host: &dyn HostAdapter) {
        if let Some(node) = self.target_node() {
            host.clear_marker(node);
        }
        if let InteractionState::Previewing { target } = &mut self.state {
            *target = None;
        }
        self.label = None;
    }

    fn lock(&mut self, target: TargetedElement) {
        debug!(component = %target.component_name, "locking selection");
        self.pending_refresh = None;
        self.state = InteractionState::Locked {
            target,
            compose: ComposeState::editing(),
        };
    }

    fn update_label(&mut self, host: &dyn HostAdapter) {
        self.label = self.target().and_then(|target| {
            host.geometry(target.node).map(|rect| LabelAnchor {
                x: rect.x + 2.0,
                y: rect.bottom() + 4.0,
                heading: target.component_name.clone(),
                classes: target.joined_classes(),
            })
        });
    }

    fn reset_to_idle(&mut self, host: &dyn HostAdapter) {
        if let Some(node) = self.target_node() {
            host.clear_marker(node);
        }
        self.state = InteractionState::Idle;
        self.label = None;
        self.pending_refresh = None;
        self.last_refresh_accepted = None;
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
