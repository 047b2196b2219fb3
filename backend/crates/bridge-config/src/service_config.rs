use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_READY_PATH, DEFAULT_SERVICE_BINARY,
    DEFAULT_SHUTDOWN_PATH, ReadinessCheck, ServiceMode,
};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub mode: ServiceMode,
    /// Executable for `mode = "process"`: a path, or a bare name searched
    /// next to the current executable and then on `PATH`.
    pub binary: String,
    /// Extra arguments for the process
    pub args: Vec<String>,
    pub readiness: ReadinessCheck,
    pub ready_path: String,
    pub shutdown_path: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            mode: ServiceMode::default(),
            binary: String::from(DEFAULT_SERVICE_BINARY),
            args: Vec::new(),
            readiness: ReadinessCheck::default(),
            ready_path: String::from(DEFAULT_READY_PATH),
            shutdown_path: String::from(DEFAULT_SHUTDOWN_PATH),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        for (field, path) in [
            ("service.ready_path", &self.ready_path),
            ("service.shutdown_path", &self.shutdown_path),
        ] {
            if !path.starts_with('/') {
                return Err(ConfigError::service(format!(
                    "{field} must start with '/', got '{path}'"
                )));
            }
        }

        if self.mode == ServiceMode::Process && self.binary.trim().is_empty() {
            return Err(ConfigError::service(
                "service.binary is required when service.mode = \"process\"",
            ));
        }

        Ok(())
    }
}
