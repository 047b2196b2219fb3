//! Serves the bridge router inside the host process.
//!
//! Every instance runs on its own runtime, so forced termination can drop
//! the accept loop and every open connection at once.

use crate::server::{
    LifecycleError, LifecycleResult, ReadinessProbe, ReservedPort, ServiceInstance,
    ServiceLauncher, discard_unready,
};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use bridge_server::{AppState, ServerResult, ShutdownCoordinator, build_router, serve};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const SERVICE_WORKER_THREADS: usize = 2;

/// Builds the host's application routes for each new instance.
pub type AppFactory = Arc<dyn Fn() -> Router + Send + Sync>;

pub struct InProcessLauncher {
    app: AppFactory,
    probe: ReadinessProbe,
    kill_timeout: Duration,
}

impl InProcessLauncher {
    /// Launcher serving only the control routes.
    pub fn new(probe: ReadinessProbe, kill_timeout: Duration) -> Self {
        Self {
            app: Arc::new(Router::<()>::new),
            probe,
            kill_timeout,
        }
    }

    /// Merge the router produced by `factory` into every instance.
    pub fn with_app<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Router + Send + Sync + 'static,
    {
        self.app = Arc::new(factory);
        self
    }

    fn build_runtime(&self) -> LifecycleResult<Runtime> {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(SERVICE_WORKER_THREADS)
            .thread_name("bridge-service")
            .enable_all()
            .build()
            .map_err(|e| LifecycleError::service_init(format!("service runtime: {e}")))
    }
}

#[async_trait]
impl ServiceLauncher for InProcessLauncher {
    async fn launch(&self, reserved: ReservedPort) -> LifecycleResult<Box<dyn ServiceInstance>> {
        let addr = reserved.addr();
        let runtime = self.build_runtime()?;

        let std_listener = reserved.into_listener();
        std_listener
            .set_nonblocking(true)
            .map_err(|e| LifecycleError::service_init(format!("listener setup: {e}")))?;
        let listener = {
            let _enter = runtime.enter();
            tokio::net::TcpListener::from_std(std_listener)
                .map_err(|e| LifecycleError::service_init(format!("listener setup: {e}")))?
        };

        let shutdown = ShutdownCoordinator::new();
        let router = build_router(AppState::new(shutdown.clone()), (self.app)());
        let task = runtime.spawn(serve(listener, router, shutdown.clone()));

        let mut instance = InProcessInstance {
            addr,
            shutdown,
            task,
            runtime: Some(runtime),
            exited: false,
        };

        if let Err(e) = self.probe.wait_ready(&mut instance).await {
            discard_unready(&mut instance, self.kill_timeout).await;
            return Err(e);
        }

        info!(%addr, "In-process service started");
        Ok(Box::new(instance))
    }
}

pub struct InProcessInstance {
    addr: SocketAddr,
    shutdown: ShutdownCoordinator,
    task: JoinHandle<ServerResult<()>>,
    runtime: Option<Runtime>,
    exited: bool,
}

impl InProcessInstance {
    fn shutdown_runtime(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[async_trait]
impl ServiceInstance for InProcessInstance {
    fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn describe(&self) -> String {
        format!("in-process service on {}", self.addr)
    }

    /// A service told to shut down (by us or over its admin route) counts
    /// as exited: it no longer accepts connections.
    fn has_exited(&mut self) -> bool {
        self.exited
            || self.runtime.is_none()
            || self.shutdown.is_shutdown()
            || self.task.is_finished()
    }

    async fn request_shutdown(&mut self) -> LifecycleResult<()> {
        self.shutdown.shutdown();
        Ok(())
    }

    async fn wait_exited(&mut self) {
        if self.exited {
            return;
        }

        match (&mut self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(addr = %self.addr, "Service stopped with error: {e}"),
            Err(e) if e.is_cancelled() => {}
            Err(e) => warn!(addr = %self.addr, "Service task failed: {e}"),
        }
        self.exited = true;
        self.shutdown_runtime();
    }

    async fn kill(&mut self) -> LifecycleResult<()> {
        self.task.abort();
        self.shutdown_runtime();
        Ok(())
    }
}

impl Drop for InProcessInstance {
    fn drop(&mut self) {
        self.shutdown_runtime();
    }
}
