use crate::ShutdownCoordinator;

use tokio::sync::watch;

/// Helper for awaiting shutdown in async tasks
pub struct ShutdownGuard {
    shutdown_rx: watch::Receiver<bool>,
}

impl ShutdownGuard {
    pub fn new(coordinator: &ShutdownCoordinator) -> Self {
        Self {
            shutdown_rx: coordinator.subscribe(),
        }
    }

    /// Resolve once shutdown has been triggered (immediately if it already was).
    pub async fn wait(&mut self) {
        // Err means every coordinator clone is gone; nobody can trigger shutdown
        // any more, so treat it as a shutdown.
        let _ = self.shutdown_rx.wait_for(|triggered| *triggered).await;
    }

    /// Non-blocking check
    pub fn is_triggered(&self) -> bool {
        *self.shutdown_rx.borrow()
    }
}
