mod concurrency_policy;
mod config;
mod error;
mod lifecycle_config;
mod log_level;
mod logging_config;
mod readiness_check;
mod server_config;
mod service_config;
mod service_mode;

#[cfg(test)]
mod tests;

pub use concurrency_policy::ConcurrencyPolicy;
pub use config::Config;
pub use error::{ConfigError, ConfigErrorResult};
pub use lifecycle_config::LifecycleConfig;
pub use log_level::LogLevel;
pub use logging_config::LoggingConfig;
pub use readiness_check::ReadinessCheck;
pub use server_config::ServerConfig;
pub use service_config::ServiceConfig;
pub use service_mode::ServiceMode;

const CONFIG_DIR_ENV: &str = "BRIDGE_CONFIG_DIR";
const DEFAULT_CONFIG_DIR: &str = ".bridge";
const CONFIG_FILENAME: &str = "config.toml";

const DEFAULT_HOST: &str = "127.0.0.1";
const LOCALHOST: &str = "localhost";
const DEFAULT_PORT: u16 = 0;

const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_READY_POLL_INTERVAL_MS: u64 = 100;
const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5_000;
const DEFAULT_KILL_TIMEOUT_MS: u64 = 2_000;
const MAX_STARTUP_TIMEOUT_SECS: u64 = 600;

const DEFAULT_SERVICE_BINARY: &str = "bridge-server";
const DEFAULT_READY_PATH: &str = "/ready";
const DEFAULT_SHUTDOWN_PATH: &str = "/admin/shutdown";

const DEFAULT_LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;
const DEFAULT_LOG_DIRECTORY: &str = "logs";
