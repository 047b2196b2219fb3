//! Runs the service as a supervised child process.

use crate::server::{
    LifecycleError, LifecycleResult, ReadinessProbe, ReservedPort, ServiceInstance,
    ServiceLauncher, discard_unready,
};

use std::net::SocketAddr;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bridge_config::Config;
use error_location::ErrorLocation;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

const SHUTDOWN_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

pub struct ProcessLauncher {
    binary: String,
    args: Vec<String>,
    shutdown_path: String,
    log_level: &'static str,
    kill_timeout: Duration,
    probe: ReadinessProbe,
    client: reqwest::Client,
}

impl ProcessLauncher {
    pub fn new(config: &Config, probe: ReadinessProbe) -> LifecycleResult<Self> {
        let service = &config.service;
        let client = reqwest::Client::builder()
            .timeout(SHUTDOWN_REQUEST_TIMEOUT)
            .no_proxy()
            .build()?;

        Ok(Self {
            binary: service.binary.clone(),
            args: service.args.clone(),
            shutdown_path: service.shutdown_path.clone(),
            log_level: config.logging.level.as_str(),
            kill_timeout: config.lifecycle.kill_timeout(),
            probe,
            client,
        })
    }

    /// Locate the service executable.
    ///
    /// Search order:
    /// 1. `binary` itself when it names a path
    /// 2. Sibling to the current executable
    /// 3. System PATH
    #[track_caller]
    pub fn find_binary(&self) -> LifecycleResult<PathBuf> {
        let not_found = LifecycleError::BinaryNotFound {
            name: self.binary.clone(),
            location: ErrorLocation::from(Location::caller()),
        };

        let candidate = Path::new(&self.binary);
        if candidate.components().count() > 1 || candidate.is_absolute() {
            return if candidate.is_file() {
                Ok(candidate.to_path_buf())
            } else {
                Err(not_found)
            };
        }

        let file_name = format!("{}{}", self.binary, std::env::consts::EXE_SUFFIX);

        if let Ok(exe) = std::env::current_exe()
            && let Some(exe_dir) = exe.parent()
        {
            let sibling = exe_dir.join(&file_name);
            if sibling.is_file() {
                debug!(path = %sibling.display(), "Using service binary (sibling)");
                return Ok(sibling);
            }
        }

        if let Some(paths) = std::env::var_os("PATH") {
            for dir in std::env::split_paths(&paths) {
                let path = dir.join(&file_name);
                if path.is_file() {
                    debug!(path = %path.display(), "Using service binary (PATH)");
                    return Ok(path);
                }
            }
        }

        Err(not_found)
    }

    fn command(&self, binary: &Path, addr: SocketAddr) -> Command {
        let mut cmd = Command::new(binary);
        cmd.args(&self.args)
            .env("BRIDGE_SERVER_HOST", addr.ip().to_string())
            .env("BRIDGE_SERVER_PORT", addr.port().to_string())
            .env("BRIDGE_LOG_LEVEL", self.log_level)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(windows)]
        {
            use windows_sys::Win32::System::Threading::CREATE_NEW_PROCESS_GROUP;

            // Own process group so CTRL_BREAK reaches only the child.
            cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
        }

        cmd
    }
}

#[async_trait]
impl ServiceLauncher for ProcessLauncher {
    async fn launch(&self, reserved: ReservedPort) -> LifecycleResult<Box<dyn ServiceInstance>> {
        let binary = self.find_binary()?;

        // The child binds the address itself.
        let addr = reserved.release();

        let child = self
            .command(&binary, addr)
            .spawn()
            .map_err(|source| LifecycleError::ProcessSpawn {
                path: binary.clone(),
                source,
                location: ErrorLocation::from(Location::caller()),
            })?;

        let mut instance = ProcessInstance {
            addr,
            pid: child.id(),
            child,
            client: self.client.clone(),
            shutdown_url: format!("http://{addr}{}", self.shutdown_path),
            exit_status: None,
        };
        info!(pid = ?instance.pid, binary = %binary.display(), %addr, "Spawned service process");

        if let Err(e) = self.probe.wait_ready(&mut instance).await {
            discard_unready(&mut instance, self.kill_timeout).await;
            return Err(e);
        }

        Ok(Box::new(instance))
    }
}

pub struct ProcessInstance {
    addr: SocketAddr,
    pid: Option<u32>,
    child: Child,
    client: reqwest::Client,
    shutdown_url: String,
    exit_status: Option<String>,
}

impl ProcessInstance {
    fn send_terminate_signal(&self) -> LifecycleResult<()> {
        let Some(pid) = self.pid else {
            return Ok(());
        };

        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            info!(pid, "Sending SIGTERM");
            let raw = i32::try_from(pid)
                .map_err(|_| LifecycleError::shutdown(format!("pid {pid} out of range")))?;
            kill(Pid::from_raw(raw), Signal::SIGTERM)
                .map_err(|e| LifecycleError::shutdown(format!("SIGTERM to {pid}: {e}")))?;
        }

        #[cfg(windows)]
        {
            use windows_sys::Win32::System::Console::{CTRL_BREAK_EVENT, GenerateConsoleCtrlEvent};

            info!(pid, "Sending CTRL_BREAK");
            // SAFETY: plain Win32 call on a process group id we created.
            let ok = unsafe { GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, pid) };
            if ok == 0 {
                return Err(LifecycleError::shutdown(format!(
                    "CTRL_BREAK to {pid}: {}",
                    std::io::Error::last_os_error()
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl ServiceInstance for ProcessInstance {
    fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn describe(&self) -> String {
        match (&self.exit_status, self.pid) {
            (Some(status), _) => format!("service process {status}"),
            (None, Some(pid)) => format!("service process pid {pid}"),
            (None, None) => String::from("service process"),
        }
    }

    fn has_exited(&mut self) -> bool {
        if self.exit_status.is_some() {
            return true;
        }

        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit_status = Some(status.to_string());
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(pid = ?self.pid, "Failed to poll service process: {e}");
                false
            }
        }
    }

    async fn request_shutdown(&mut self) -> LifecycleResult<()> {
        match self.client.post(&self.shutdown_url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(pid = ?self.pid, "Graceful shutdown request acknowledged");
                return Ok(());
            }
            Ok(resp) => warn!("Shutdown request returned HTTP {}", resp.status()),
            Err(e) => warn!("Failed to send shutdown request: {e}"),
        }

        // Fallback to OS-level signals
        self.send_terminate_signal()
    }

    async fn wait_exited(&mut self) {
        if self.exit_status.is_some() {
            return;
        }

        match self.child.wait().await {
            Ok(status) => {
                debug!(pid = ?self.pid, %status, "Service process exited");
                self.exit_status = Some(status.to_string());
            }
            Err(e) => warn!(pid = ?self.pid, "Failed to wait for service process: {e}"),
        }
    }

    async fn kill(&mut self) -> LifecycleResult<()> {
        if self.has_exited() {
            return Ok(());
        }

        info!(pid = ?self.pid, "Force killing service process");
        self.child
            .start_kill()
            .map_err(|e| LifecycleError::shutdown(format!("kill: {e}")))
    }
}
