//! Administrative endpoints for server management.

use crate::AppState;

use axum::{extract::State, http::StatusCode};
use log::info;

/// POST /admin/shutdown
///
/// Acknowledges immediately; the server stops accepting new connections and
/// exits once in-flight requests finish. Repeated calls are harmless.
pub async fn shutdown_handler(State(state): State<AppState>) -> StatusCode {
    info!("Graceful shutdown requested via HTTP");
    state.shutdown.shutdown();
    StatusCode::ACCEPTED
}
