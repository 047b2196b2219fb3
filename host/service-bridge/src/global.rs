//! Process-wide manager behind the control surface.
//!
//! Created lazily by the first start so a failed creation can be retried.
//!
//! The manager lives in a static and is never dropped. In process mode an
//! exit hook stops the service so a host that exits without calling
//! [`stop`] does not leave the child running. In-process services end with
//! the host process.

use crate::logging;
use crate::server::{LifecycleError, LifecycleResult, ServerManager, StartResult};

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, Once, PoisonError};

use bridge_config::{Config, ServiceMode};
use tracing::{debug, error, info, warn};

static MANAGER: Mutex<Option<Arc<ServerManager>>> = Mutex::new(None);
static LOGGING: Once = Once::new();
static EXIT_HOOK: Once = Once::new();

extern "C" fn stop_at_exit() {
    stop();
}

fn install_exit_hook() {
    EXIT_HOOK.call_once(|| {
        // SAFETY: registers a plain `extern "C"` function with no captured state.
        if unsafe { libc::atexit(stop_at_exit) } != 0 {
            warn!("Failed to register exit hook; call stop() before exiting");
        }
    });
}

fn manager() -> LifecycleResult<Arc<ServerManager>> {
    let mut slot = MANAGER.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(manager) = slot.as_ref() {
        return Ok(Arc::clone(manager));
    }

    let config_dir = Config::config_dir()?;
    let config = Config::load_from(&config_dir)?;
    config.validate()?;

    LOGGING.call_once(|| {
        if let Err(e) = logging::setup_logging(&config, &config_dir) {
            eprintln!("service-bridge: failed to set up logging: {e}");
        }
    });
    info!("service-bridge v{} initializing", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let mode = config.service.mode;
    let manager = Arc::new(ServerManager::new(config)?);
    *slot = Some(Arc::clone(&manager));

    if mode == ServiceMode::Process {
        install_exit_hook();
    }
    Ok(manager)
}

fn existing_manager() -> Option<Arc<ServerManager>> {
    MANAGER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(Arc::clone)
}

/// Start the embedded service, or return the port it already runs on.
pub fn start() -> StartResult {
    let result = catch_unwind(AssertUnwindSafe(|| manager()?.start()))
        .unwrap_or_else(|_| Err(LifecycleError::internal("panic during start")));

    let outcome = StartResult::from(result);
    debug!(%outcome, "start");
    outcome
}

/// Stop the embedded service. A no-op when nothing is running.
pub fn stop() {
    let Some(manager) = existing_manager() else {
        debug!("stop: service was never started");
        return;
    };

    if catch_unwind(AssertUnwindSafe(|| manager.stop())).is_err() {
        error!("panic during stop");
    }
}
