//! # Pinpoint Protocols
//!
//! Wire vocabulary shared by the relay server, the relay client, and the
//! selection state machine. Contains only data shapes - no behavior.

pub mod event;
pub mod http;

pub use event::{sse_frame, AgentEvent, SSE_DATA_PREFIX};
pub use http::{ErrorBody, ExecuteAck, ExecuteRequest, HealthStatus};
