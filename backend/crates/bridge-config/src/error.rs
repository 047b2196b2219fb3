use std::panic::Location;
use std::path::PathBuf;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("{section} config error: {message} {location}")]
    Invalid {
        section: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("Unrecognized value '{value}' for {field} (expected one of: {expected}) {location}")]
    UnknownVariant {
        field: &'static str,
        value: String,
        expected: &'static str,
        location: ErrorLocation,
    },

    #[error("Environment variable {var} is invalid: {message} {location}")]
    Env {
        var: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[track_caller]
    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::invalid("server", message)
    }

    #[track_caller]
    pub fn lifecycle<S: Into<String>>(message: S) -> Self {
        Self::invalid("lifecycle", message)
    }

    #[track_caller]
    pub fn service<S: Into<String>>(message: S) -> Self {
        Self::invalid("service", message)
    }

    #[track_caller]
    pub fn logging<S: Into<String>>(message: S) -> Self {
        Self::invalid("logging", message)
    }

    /// Build an error for an enum-like setting that did not parse.
    #[track_caller]
    pub fn unknown_variant(field: &'static str, value: &str, expected: &'static str) -> Self {
        Self::UnknownVariant {
            field,
            value: value.to_string(),
            expected,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn env<S: Into<String>>(var: &'static str, message: S) -> Self {
        Self::Env {
            var,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    fn invalid<S: Into<String>>(section: &'static str, message: S) -> Self {
        Self::Invalid {
            section,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type ConfigErrorResult<T> = StdResult<T, ConfigError>;
