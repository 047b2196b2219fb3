use crate::ConfigError;

use std::str::FromStr;

use serde::Deserialize;

/// What a start call does when another start or stop is already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Wait for the in-flight operation, then apply the idempotent-start rule.
    #[default]
    Block,
    /// Fail immediately with "already in progress".
    Reject,
}

impl FromStr for ConcurrencyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "block" => Ok(Self::Block),
            "reject" => Ok(Self::Reject),
            _ => Err(ConfigError::unknown_variant(
                "lifecycle.concurrency",
                s,
                "block, reject",
            )),
        }
    }
}
