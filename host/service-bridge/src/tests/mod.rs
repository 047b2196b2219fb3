mod error_code;
mod in_process;
mod readiness;

use crate::server::{
    LifecycleError, LifecycleResult, PortAllocator, ReadinessProbe, ReservedPort, ServerManager,
    ServiceInstance, ServiceLauncher,
};

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bridge_config::{Config, ReadinessCheck};
use error_location::ErrorLocation;
use tokio::sync::Semaphore;

/// Config with short timeouts and TCP readiness.
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.lifecycle.startup_timeout_secs = 5;
    config.lifecycle.ready_poll_interval_ms = 20;
    config.lifecycle.shutdown_grace_ms = 300;
    config.lifecycle.kill_timeout_ms = 500;
    config.service.readiness = ReadinessCheck::Tcp;
    config
}

pub(crate) fn accepts_connections(port: u16) -> bool {
    TcpStream::connect_timeout(
        &SocketAddr::from(([127, 0, 0, 1], port)),
        Duration::from_millis(500),
    )
    .is_ok()
}

pub(crate) fn manager_with(
    config: Config,
    allocator: Arc<dyn PortAllocator>,
    launcher: Arc<FakeLauncher>,
) -> ServerManager {
    ServerManager::with_parts(config, allocator, launcher).unwrap()
}

/// Allocator that can be switched into an "all ports taken" mode.
#[derive(Default)]
pub(crate) struct ToggleAllocator {
    pub(crate) exhausted: AtomicBool,
}

impl PortAllocator for ToggleAllocator {
    fn reserve(&self, addr: SocketAddr) -> LifecycleResult<ReservedPort> {
        if self.exhausted.load(Ordering::SeqCst) {
            return Err(LifecycleError::PortAllocation {
                host: addr.ip(),
                source: std::io::Error::new(std::io::ErrorKind::AddrNotAvailable, "exhausted"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        ReservedPort::bind(addr)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    Serve,
    FailInit,
    IgnoreShutdown,
}

/// Blocks a launch until the test releases it.
pub(crate) struct Gate {
    entered: Mutex<mpsc::Sender<()>>,
    release: Arc<Semaphore>,
}

impl Gate {
    pub(crate) fn new() -> (Self, mpsc::Receiver<()>, Arc<Semaphore>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let release = Arc::new(Semaphore::new(0));
        let gate = Self {
            entered: Mutex::new(entered_tx),
            release: Arc::clone(&release),
        };
        (gate, entered_rx, release)
    }
}

/// Launcher whose instances just hold the reserved listener open.
pub(crate) struct FakeLauncher {
    behavior: Behavior,
    probe: ReadinessProbe,
    gate: Option<Gate>,
    pub(crate) launches: AtomicUsize,
    pub(crate) events: Arc<Mutex<Vec<&'static str>>>,
    pub(crate) crash_switches: Mutex<Vec<Arc<AtomicBool>>>,
}

impl FakeLauncher {
    pub(crate) fn new(behavior: Behavior) -> Self {
        let config = test_config();
        Self {
            behavior,
            probe: ReadinessProbe::new(&config.service, &config.lifecycle).unwrap(),
            gate: None,
            launches: AtomicUsize::new(0),
            events: Arc::new(Mutex::new(Vec::new())),
            crash_switches: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn gated(behavior: Behavior, gate: Gate) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(behavior)
        }
    }

    pub(crate) fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub(crate) fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    /// Make the most recent instance report that it died.
    pub(crate) fn crash_latest(&self) {
        if let Some(switch) = self.crash_switches.lock().unwrap().last() {
            switch.store(true, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl ServiceLauncher for FakeLauncher {
    async fn launch(&self, reserved: ReservedPort) -> LifecycleResult<Box<dyn ServiceInstance>> {
        if let Some(gate) = &self.gate {
            let _ = gate.entered.lock().unwrap().send(());
            gate.release.acquire().await.unwrap().forget();
        }

        self.launches.fetch_add(1, Ordering::SeqCst);

        if self.behavior == Behavior::FailInit {
            reserved.release();
            return Err(LifecycleError::service_init("refused to start"));
        }

        let crashed = Arc::new(AtomicBool::new(false));
        self.crash_switches.lock().unwrap().push(Arc::clone(&crashed));

        let mut instance = FakeInstance {
            addr: reserved.addr(),
            listener: Some(reserved.into_listener()),
            ignore_shutdown: self.behavior == Behavior::IgnoreShutdown,
            crashed,
            events: Arc::clone(&self.events),
        };
        self.probe.wait_ready(&mut instance).await?;

        Ok(Box::new(instance))
    }
}

pub(crate) struct FakeInstance {
    addr: SocketAddr,
    listener: Option<TcpListener>,
    ignore_shutdown: bool,
    crashed: Arc<AtomicBool>,
    events: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl ServiceInstance for FakeInstance {
    fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn describe(&self) -> String {
        format!("fake service on {}", self.addr)
    }

    fn has_exited(&mut self) -> bool {
        self.listener.is_none() || self.crashed.load(Ordering::SeqCst)
    }

    async fn request_shutdown(&mut self) -> LifecycleResult<()> {
        self.events.lock().unwrap().push("shutdown");
        if !self.ignore_shutdown {
            self.listener = None;
        }
        Ok(())
    }

    async fn wait_exited(&mut self) {
        while self.listener.is_some() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn kill(&mut self) -> LifecycleResult<()> {
        self.events.lock().unwrap().push("kill");
        self.listener = None;
        Ok(())
    }
}
