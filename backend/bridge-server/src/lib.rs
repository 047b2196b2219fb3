pub mod admin;
pub mod app_state;
pub mod error;
pub mod health;
pub mod logger;
pub mod routes;
pub mod serve;
pub mod shutdown_coordinator;
pub mod shutdown_guard;


pub use app_state::AppState;
pub use error::{Result as ServerResult, ServerError};
pub use routes::build_router;
pub use serve::{bind_loopback, serve};
pub use shutdown_coordinator::ShutdownCoordinator;
pub use shutdown_guard::ShutdownGuard;
