use crate::server::{ErrorCode, LifecycleResult};

use std::fmt;

/// Outcome of a start request. A port is only ever present on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartResult {
    Started { port: u16 },
    Failed { code: ErrorCode },
}

impl StartResult {
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started { .. })
    }

    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Started { port } => Some(*port),
            Self::Failed { .. } => None,
        }
    }

    /// Status code plus the port to publish, if any.
    pub fn into_raw(self) -> (i32, Option<u16>) {
        match self {
            Self::Started { port } => (ErrorCode::SUCCESS, Some(port)),
            Self::Failed { code } => (code.as_raw(), None),
        }
    }
}

impl From<LifecycleResult<u16>> for StartResult {
    fn from(result: LifecycleResult<u16>) -> Self {
        match result {
            Ok(port) => Self::Started { port },
            Err(e) => Self::Failed { code: e.code() },
        }
    }
}

impl fmt::Display for StartResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { port } => write!(f, "started on port {port}"),
            Self::Failed { code } => write!(f, "failed: {code}"),
        }
    }
}
