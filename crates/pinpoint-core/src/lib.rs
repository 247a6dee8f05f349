//! # Pinpoint Core
//!
//! The interaction core of Pinpoint: resolve the element under the
//! pointer, track the selection through preview/lock/compose, and build
//! the structured edit prompt that gets handed to an editor deep link or
//! to the agent relay.
//!
//! Everything here is host-agnostic. DOM access goes through the
//! [`HostAdapter`] capability trait supplied by a framework-specific
//! embedder; time enters through explicit `Instant` values so the whole
//! machine is deterministic under test.

pub mod deeplink;
pub mod element;
pub mod host;
pub mod locate;
pub mod machine;
pub mod prompt;

pub use deeplink::DeepLinkSink;
pub use element::{SourceLocation, TargetedElement, MARKER_CLASS};
pub use host::{HostAdapter, NodeDescription, NodeId, OwnerLink, Rect};
pub use locate::locate;
pub use machine::{DispatchMode, Effect, InteractionState, Scope, SelectionMachine};
pub use prompt::{build as build_prompt, PromptPayload};
