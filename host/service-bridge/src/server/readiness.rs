//! Readiness polling for freshly launched services.

use crate::server::{LifecycleError, LifecycleResult, ServiceInstance};

use std::net::SocketAddr;
use std::panic::Location;
use std::time::{Duration, Instant};

use bridge_config::{LifecycleConfig, ReadinessCheck, ServiceConfig};
use error_location::ErrorLocation;
use tracing::{debug, info};

const PROBE_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Polls a service until it answers or the startup timeout elapses.
#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    check: ReadinessCheck,
    ready_path: String,
    timeout: Duration,
    poll_interval: Duration,
    client: reqwest::Client,
}

impl ReadinessProbe {
    pub fn new(service: &ServiceConfig, lifecycle: &LifecycleConfig) -> LifecycleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(PROBE_REQUEST_TIMEOUT)
            .pool_max_idle_per_host(0)
            .no_proxy()
            .build()?;

        Ok(Self {
            check: service.readiness,
            ready_path: service.ready_path.clone(),
            timeout: lifecycle.startup_timeout(),
            poll_interval: lifecycle.ready_poll_interval(),
            client,
        })
    }

    /// Single probe. `Err` carries the reason the service is not ready yet.
    pub async fn probe(&self, addr: SocketAddr) -> Result<(), String> {
        match self.check {
            ReadinessCheck::Tcp => tokio::net::TcpStream::connect(addr)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            ReadinessCheck::Http => {
                let url = format!("http://{addr}{}", self.ready_path);
                match self.client.get(&url).send().await {
                    Ok(resp) if resp.status().is_success() => Ok(()),
                    Ok(resp) => Err(format!("HTTP {}", resp.status())),
                    Err(e) => Err(e.to_string()),
                }
            }
        }
    }

    /// Poll `instance` until ready.
    ///
    /// Fails early if the instance exits while being polled.
    #[track_caller]
    pub fn wait_ready<'a>(
        &'a self,
        instance: &'a mut dyn ServiceInstance,
    ) -> impl Future<Output = LifecycleResult<()>> + Send + 'a {
        let caller = Location::caller();

        async move {
            let addr = instance.addr();
            let started = Instant::now();
            let mut attempts: u32 = 0;

            loop {
                if instance.has_exited() {
                    return Err(LifecycleError::ServiceExited {
                        status: instance.describe(),
                        location: ErrorLocation::from(caller),
                    });
                }

                attempts += 1;
                let last_error = match self.probe(addr).await {
                    Ok(()) => {
                        info!(
                            %addr,
                            attempts,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Service ready"
                        );
                        return Ok(());
                    }
                    Err(e) => e,
                };

                if started.elapsed() >= self.timeout {
                    return Err(LifecycleError::StartupTimeout {
                        timeout_ms: self.timeout.as_millis(),
                        last_error,
                        location: ErrorLocation::from(caller),
                    });
                }

                debug!(%addr, attempts, "Not ready yet: {last_error}");
                tokio::time::sleep(self.poll_interval).await;
            }
        }
    }
}
