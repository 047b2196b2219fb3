//! Server lifecycle management.
//!
//! `ServerManager` owns at most one running service and serializes every
//! start and stop against it.

use crate::server::{
    InProcessLauncher, LifecycleError, LifecycleResult, LoopbackAllocator, PortAllocator,
    ProcessLauncher, ReadinessProbe, ServerState, ServiceInstance, ServiceLauncher,
};

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::{Duration, Instant};

use bridge_config::{ConcurrencyPolicy, Config, ServiceMode};
use error_location::ErrorLocation;
use tokio::runtime::Runtime;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

const WORKER_THREADS: usize = 2;

/// What the manager currently holds.
enum ServerHandle {
    Absent,
    Running(Box<dyn ServiceInstance>),
}

pub struct ServerManager {
    config: Config,
    runtime: ManagerRuntime,
    allocator: Arc<dyn PortAllocator>,
    launcher: Arc<dyn ServiceLauncher>,
    handle: Mutex<ServerHandle>,
    state_tx: watch::Sender<ServerState>,
}

impl ServerManager {
    /// Manager with the launcher selected by `service.mode`.
    pub fn new(config: Config) -> LifecycleResult<Self> {
        config.validate()?;

        let probe = ReadinessProbe::new(&config.service, &config.lifecycle)?;
        let launcher: Arc<dyn ServiceLauncher> = match config.service.mode {
            ServiceMode::InProcess => Arc::new(InProcessLauncher::new(
                probe,
                config.lifecycle.kill_timeout(),
            )),
            ServiceMode::Process => Arc::new(ProcessLauncher::new(&config, probe)?),
        };

        Self::with_parts(config, Arc::new(LoopbackAllocator), launcher)
    }

    /// Manager with explicit allocation and launch strategies.
    #[track_caller]
    pub fn with_parts(
        config: Config,
        allocator: Arc<dyn PortAllocator>,
        launcher: Arc<dyn ServiceLauncher>,
    ) -> LifecycleResult<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("service-bridge")
            .enable_all()
            .build()
            .map_err(|source| LifecycleError::Runtime {
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let (state_tx, _) = watch::channel(ServerState::Absent);

        Ok(Self {
            config,
            runtime: ManagerRuntime(Some(runtime)),
            allocator,
            launcher,
            handle: Mutex::new(ServerHandle::Absent),
            state_tx,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ServerState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ServerState> {
        self.state_tx.subscribe()
    }

    /// Start the service, or report the port of the one already running.
    ///
    /// A previously started instance that has since died is discarded and
    /// replaced. On failure nothing is left running.
    pub fn start(&self) -> LifecycleResult<u16> {
        let mut handle = self.lock_for_start()?;

        if let ServerHandle::Running(instance) = &mut *handle {
            let _enter = self.runtime.get().enter();
            if !instance.has_exited() {
                let port = instance.port();
                debug!(port, "Service already running");
                return Ok(port);
            }

            warn!(
                instance = %instance.describe(),
                "Service exited unexpectedly; launching a new instance"
            );
            *handle = ServerHandle::Absent;
        }

        self.set_state(ServerState::Starting);
        let started = Instant::now();

        match self.launch() {
            Ok(instance) => {
                let port = instance.port();
                *handle = ServerHandle::Running(instance);
                self.set_state(ServerState::Running { port });
                info!(
                    port,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Service started"
                );
                Ok(port)
            }
            Err(e) => {
                self.set_state(ServerState::Absent);
                error!(code = %e.code(), kind = e.as_label(), "Service start failed: {e}");
                Err(e)
            }
        }
    }

    /// Stop the running service, if any. Never fails.
    ///
    /// The service gets `shutdown_grace` to exit on its own before it is
    /// forcibly terminated.
    pub fn stop(&self) {
        let mut handle = self.handle.lock().unwrap_or_else(PoisonError::into_inner);

        let ServerHandle::Running(instance) = std::mem::replace(&mut *handle, ServerHandle::Absent)
        else {
            debug!("Stop requested with no service running");
            self.set_state(ServerState::Absent);
            return;
        };

        self.set_state(ServerState::Stopping);
        let port = instance.port();
        let grace = self.config.lifecycle.shutdown_grace();
        let kill_timeout = self.config.lifecycle.kill_timeout();

        self.block_on(terminate(instance, grace, kill_timeout));

        self.set_state(ServerState::Absent);
        info!(port, "Service stopped");
    }

    fn lock_for_start(&self) -> LifecycleResult<MutexGuard<'_, ServerHandle>> {
        match self.config.lifecycle.concurrency {
            ConcurrencyPolicy::Block => Ok(self.handle.lock().unwrap_or_else(PoisonError::into_inner)),
            ConcurrencyPolicy::Reject => match self.handle.try_lock() {
                Ok(guard) => Ok(guard),
                Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => {
                    warn!("Start rejected: another lifecycle operation is in progress");
                    Err(LifecycleError::already_in_progress())
                }
            },
        }
    }

    fn launch(&self) -> LifecycleResult<Box<dyn ServiceInstance>> {
        let ephemeral = SocketAddr::new(self.config.server.loopback_ip()?, 0);
        let reserved = self.allocator.reserve(ephemeral)?;
        let launcher = Arc::clone(&self.launcher);

        self.block_on(async move { launcher.launch(reserved).await })
    }

    /// Run `future` to completion on the manager's runtime.
    ///
    /// Callers already inside an async runtime get a scoped helper thread,
    /// since blocking on a runtime from within one panics.
    fn block_on<F>(&self, future: F) -> F::Output
    where
        F: Future + Send,
        F::Output: Send,
    {
        let runtime = self.runtime.get();
        if tokio::runtime::Handle::try_current().is_err() {
            return runtime.block_on(future);
        }

        std::thread::scope(|scope| {
            match scope.spawn(|| runtime.block_on(future)).join() {
                Ok(output) => output,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        })
    }

    fn set_state(&self, state: ServerState) {
        self.state_tx.send_replace(state);
    }
}

impl Drop for ServerManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Graceful shutdown, escalating to forced termination after `grace`.
async fn terminate(mut instance: Box<dyn ServiceInstance>, grace: Duration, kill_timeout: Duration) {
    let name = instance.describe();

    if let Err(e) = instance.request_shutdown().await {
        warn!(instance = %name, "Graceful shutdown request failed: {e}");
    }

    if tokio::time::timeout(grace, instance.wait_exited()).await.is_ok() {
        info!(instance = %name, "Service exited gracefully");
        return;
    }

    warn!(
        instance = %name,
        grace_ms = grace.as_millis() as u64,
        "Service did not exit in time; forcing termination"
    );
    if let Err(e) = instance.kill().await {
        error!(instance = %name, "Forced termination failed: {e}");
    }

    if tokio::time::timeout(kill_timeout, instance.wait_exited())
        .await
        .is_err()
    {
        error!(instance = %name, "Service still running after forced termination; abandoning it");
    }
}

/// Runtime that can be dropped from any context.
struct ManagerRuntime(Option<Runtime>);

impl ManagerRuntime {
    fn get(&self) -> &Runtime {
        self.0
            .as_ref()
            .unwrap_or_else(|| unreachable!("runtime is only taken on drop"))
    }
}

impl Drop for ManagerRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}
