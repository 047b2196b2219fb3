use crate::server::ErrorCode;

use std::net::IpAddr;
use std::panic::Location;
use std::path::PathBuf;

use bridge_config::ConfigError;
use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Failed to reserve a loopback port on {host}: {source} {location}")]
    PortAllocation {
        host: IpAddr,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Refusing to bind non-loopback address {host} {location}")]
    NotLoopback { host: IpAddr, location: ErrorLocation },

    #[error("Configuration invalid: {source} {location}")]
    ConfigInvalid {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },

    #[error("Failed to build async runtime: {source} {location}")]
    Runtime {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Service binary '{name}' not found {location}")]
    BinaryNotFound { name: String, location: ErrorLocation },

    #[error("Failed to spawn service process {path}: {source} {location}")]
    ProcessSpawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Service failed to initialize: {message} {location}")]
    ServiceInit {
        message: String,
        location: ErrorLocation,
    },

    #[error("Service exited before becoming ready ({status}) {location}")]
    ServiceExited {
        status: String,
        location: ErrorLocation,
    },

    #[error("Service not ready within {timeout_ms}ms (last error: {last_error}) {location}")]
    StartupTimeout {
        timeout_ms: u128,
        last_error: String,
        location: ErrorLocation,
    },

    #[error("Another lifecycle operation is in progress {location}")]
    AlreadyInProgress { location: ErrorLocation },

    #[error("Shutdown request failed: {message} {location}")]
    Shutdown {
        message: String,
        location: ErrorLocation,
    },

    #[error("HTTP error: {source} {location}")]
    Http {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },

    #[error("Internal failure: {message} {location}")]
    Internal {
        message: String,
        location: ErrorLocation,
    },
}

impl LifecycleError {
    #[track_caller]
    pub fn service_init<S: Into<String>>(message: S) -> Self {
        Self::ServiceInit {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn shutdown<S: Into<String>>(message: S) -> Self {
        Self::Shutdown {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn already_in_progress() -> Self {
        Self::AlreadyInProgress {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Status code reported across the control surface.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PortAllocation { .. } | Self::NotLoopback { .. } => {
                ErrorCode::PortAllocationFailure
            }
            Self::BinaryNotFound { .. }
            | Self::ProcessSpawn { .. }
            | Self::ServiceInit { .. }
            | Self::ServiceExited { .. }
            | Self::StartupTimeout { .. } => ErrorCode::ServiceInitFailure,
            Self::AlreadyInProgress { .. } => ErrorCode::AlreadyInProgress,
            Self::ConfigInvalid { .. }
            | Self::Runtime { .. }
            | Self::Shutdown { .. }
            | Self::Http { .. }
            | Self::Internal { .. } => ErrorCode::InternalFailure,
        }
    }

    /// Short stable name for log fields.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::PortAllocation { .. } => "port_allocation",
            Self::NotLoopback { .. } => "not_loopback",
            Self::ConfigInvalid { .. } => "config_invalid",
            Self::Runtime { .. } => "runtime",
            Self::BinaryNotFound { .. } => "binary_not_found",
            Self::ProcessSpawn { .. } => "process_spawn",
            Self::ServiceInit { .. } => "service_init",
            Self::ServiceExited { .. } => "service_exited",
            Self::StartupTimeout { .. } => "startup_timeout",
            Self::AlreadyInProgress { .. } => "already_in_progress",
            Self::Shutdown { .. } => "shutdown",
            Self::Http { .. } => "http",
            Self::Internal { .. } => "internal",
        }
    }
}

impl From<ConfigError> for LifecycleError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        Self::ConfigInvalid {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for LifecycleError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
