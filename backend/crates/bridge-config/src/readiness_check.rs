use crate::ConfigError;

use std::str::FromStr;

use serde::Deserialize;

/// How readiness of a freshly launched service is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessCheck {
    /// `GET service.ready_path` must answer 2xx.
    #[default]
    Http,
    /// A TCP connect to the port must succeed.
    Tcp,
}

impl FromStr for ReadinessCheck {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "tcp" => Ok(Self::Tcp),
            _ => Err(ConfigError::unknown_variant(
                "service.readiness",
                s,
                "http, tcp",
            )),
        }
    }
}
