use crate::server::{LifecycleResult, ReservedPort};

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, warn};

/// Brings a service up on a reserved loopback port.
#[async_trait]
pub trait ServiceLauncher: Send + Sync {
    /// Launch on `reserved` and return once the service accepts connections.
    ///
    /// On error nothing launched may be left running.
    async fn launch(&self, reserved: ReservedPort) -> LifecycleResult<Box<dyn ServiceInstance>>;
}

/// A running service owned by the lifecycle manager.
#[async_trait]
pub trait ServiceInstance: Send {
    fn addr(&self) -> SocketAddr;

    fn port(&self) -> u16 {
        self.addr().port()
    }

    /// Human-readable identity for logs.
    fn describe(&self) -> String;

    /// True once the service has stopped serving for any reason.
    fn has_exited(&mut self) -> bool;

    /// Ask the service to finish in-flight work and exit.
    async fn request_shutdown(&mut self) -> LifecycleResult<()>;

    /// Resolve once the service has exited.
    async fn wait_exited(&mut self);

    /// Terminate without waiting for in-flight work.
    async fn kill(&mut self) -> LifecycleResult<()>;
}

/// Tear down an instance that never became ready.
///
/// Kill failures are logged; the wait for exit is bounded by `kill_timeout`.
pub async fn discard_unready(instance: &mut dyn ServiceInstance, kill_timeout: Duration) {
    let name = instance.describe();

    if let Err(e) = instance.kill().await {
        warn!(instance = %name, "Failed to terminate unready service: {e}");
    }

    if tokio::time::timeout(kill_timeout, instance.wait_exited())
        .await
        .is_err()
    {
        error!(
            instance = %name,
            kill_timeout_ms = kill_timeout.as_millis() as u64,
            "Unready service still running after forced termination; abandoning it"
        );
    }
}
