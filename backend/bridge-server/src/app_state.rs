use crate::ShutdownCoordinator;

use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub shutdown: ShutdownCoordinator,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(shutdown: ShutdownCoordinator) -> Self {
        Self {
            shutdown,
            started_at: Instant::now(),
        }
    }
}
