//! HTTP route definitions.
//!
//! ```text
//! GET  /health   - agent availability probe
//! POST /execute  - run a prompt (SSE with ?stream=true, else ack)
//! ```
//!
//! CORS is wide open: the relay only ever runs on localhost and the
//! browser overlay calls it from the app's own origin.

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{self, AppState};

/// Build the relay router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/execute", post(handlers::execute))
        .fallback(handlers::not_found)
        .layer(cors)
        .with_state(state)
}
