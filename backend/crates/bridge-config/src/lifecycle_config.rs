use crate::{
    ConcurrencyPolicy, ConfigError, ConfigErrorResult, DEFAULT_KILL_TIMEOUT_MS,
    DEFAULT_READY_POLL_INTERVAL_MS, DEFAULT_SHUTDOWN_GRACE_MS, DEFAULT_STARTUP_TIMEOUT_SECS,
    MAX_STARTUP_TIMEOUT_SECS,
};

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// How long start waits for the service to report ready
    pub startup_timeout_secs: u64,
    /// Delay between readiness probes
    pub ready_poll_interval_ms: u64,
    /// How long stop waits for a graceful exit before forcing termination
    pub shutdown_grace_ms: u64,
    /// How long stop waits after forcing termination before giving up
    pub kill_timeout_ms: u64,
    pub concurrency: ConcurrencyPolicy,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
            ready_poll_interval_ms: DEFAULT_READY_POLL_INTERVAL_MS,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
            kill_timeout_ms: DEFAULT_KILL_TIMEOUT_MS,
            concurrency: ConcurrencyPolicy::default(),
        }
    }
}

impl LifecycleConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.startup_timeout_secs == 0 || self.startup_timeout_secs > MAX_STARTUP_TIMEOUT_SECS {
            return Err(ConfigError::lifecycle(format!(
                "lifecycle.startup_timeout_secs must be 1-{}, got {}",
                MAX_STARTUP_TIMEOUT_SECS, self.startup_timeout_secs
            )));
        }

        if self.ready_poll_interval_ms == 0 {
            return Err(ConfigError::lifecycle(
                "lifecycle.ready_poll_interval_ms must be > 0",
            ));
        }

        if self.ready_poll_interval_ms >= self.startup_timeout_secs * 1_000 {
            return Err(ConfigError::lifecycle(format!(
                "lifecycle.ready_poll_interval_ms ({}) must be shorter than the startup timeout",
                self.ready_poll_interval_ms
            )));
        }

        if self.shutdown_grace_ms == 0 {
            return Err(ConfigError::lifecycle(
                "lifecycle.shutdown_grace_ms must be > 0",
            ));
        }

        if self.kill_timeout_ms == 0 {
            return Err(ConfigError::lifecycle(
                "lifecycle.kill_timeout_ms must be > 0",
            ));
        }

        Ok(())
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    pub fn ready_poll_interval(&self) -> Duration {
        Duration::from_millis(self.ready_poll_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }
}
