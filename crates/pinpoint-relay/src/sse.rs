//! Server-Sent Events plumbing.
//!
//! Events flow through an mpsc channel from the agent runner to the HTTP
//! response body; each one is framed as a `data: <JSON>\n\n` chunk.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::warn;

use pinpoint_protocols::{sse_frame, AgentEvent};

/// Turn a receiver of agent events into an SSE chunk stream.
pub fn sse_body_stream(
    mut rx: mpsc::Receiver<AgentEvent>,
) -> impl futures::Stream<Item = Result<Bytes, Infallible>> + Send + 'static {
    async_stream::stream! {
        while let Some(event) = rx.recv().await {
            match sse_frame(&event) {
                Ok(frame) => yield Ok::<Bytes, Infallible>(Bytes::from(frame)),
                Err(err) => warn!(error = %err, "failed to serialize SSE event"),
            }
        }
    }
}

/// Wrap a chunk stream in a `text/event-stream` response.
pub fn sse_response<S>(stream: S) -> Response
where
    S: futures::Stream<Item = Result<Bytes, Infallible>> + Send + 'static,
{
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    (headers, Body::from_stream(stream)).into_response()
}
