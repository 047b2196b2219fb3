use crate::{AppState, admin, health};

use axum::{
    Router,
    routing::{get, post},
};

/// Build the control routes and merge the host-supplied application router.
///
/// `app` carries whatever protocol the embedding host wants served; it must
/// not claim any of the control paths.
pub fn build_router(state: AppState, app: Router) -> Router {
    Router::new()
        // Health check endpoints
        .route("/health", get(health::health))
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness))
        // Admin endpoints
        .route("/admin/shutdown", post(admin::shutdown_handler))
        .with_state(state)
        .merge(app)
}
