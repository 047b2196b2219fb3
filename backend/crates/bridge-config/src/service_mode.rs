use crate::ConfigError;

use std::str::FromStr;

use serde::Deserialize;

/// Where the embedded service runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceMode {
    /// On the lifecycle manager's own runtime, inside the host process.
    #[default]
    InProcess,
    /// As a supervised `bridge-server` child process.
    Process,
}

impl FromStr for ServiceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "in_process" => Ok(Self::InProcess),
            "process" => Ok(Self::Process),
            _ => Err(ConfigError::unknown_variant(
                "service.mode",
                s,
                "in_process, process",
            )),
        }
    }
}
