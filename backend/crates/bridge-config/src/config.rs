use crate::{
    CONFIG_DIR_ENV, CONFIG_FILENAME, ConfigError, ConfigErrorResult, DEFAULT_CONFIG_DIR,
    LifecycleConfig, LoggingConfig, ServerConfig, ServiceConfig, ServiceMode,
};

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub lifecycle: LifecycleConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load config from the default config directory.
    ///
    /// Loading order:
    /// 1. `BRIDGE_CONFIG_DIR` env var, else `./.bridge/`
    /// 2. `config.toml` in that directory if it exists, else defaults
    /// 3. `BRIDGE_*` environment variable overrides
    ///
    /// The directory is not created; a missing directory just means defaults.
    /// Does NOT validate - call validate() after load().
    pub fn load() -> ConfigErrorResult<Self> {
        let config_dir = Self::config_dir()?;
        Self::load_from(&config_dir)
    }

    /// Load config from an explicit directory, then apply env overrides.
    pub fn load_from(config_dir: &Path) -> ConfigErrorResult<Self> {
        let config_path = config_dir.join(CONFIG_FILENAME);

        let mut config = if config_path.is_file() {
            Self::load_toml(&config_path)?
        } else {
            Config::default()
        };

        config.apply_env_overrides()?;

        Ok(config)
    }

    fn load_toml(path: &Path) -> ConfigErrorResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Toml {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the config directory.
    /// Priority: BRIDGE_CONFIG_DIR env var > ./.bridge/ (relative to cwd)
    pub fn config_dir() -> ConfigErrorResult<PathBuf> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }

        let cwd = std::env::current_dir().map_err(|e| ConfigError::Io {
            path: PathBuf::from("."),
            source: e,
        })?;
        Ok(cwd.join(DEFAULT_CONFIG_DIR))
    }

    /// Validate all sections.
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.server.validate()?;
        self.lifecycle.validate()?;
        self.service.validate()?;

        let log_dir = Path::new(&self.logging.dir);
        if log_dir.is_absolute() || self.logging.dir.contains("..") {
            return Err(ConfigError::logging(
                "logging.dir must be relative and cannot contain '..'",
            ));
        }

        Ok(())
    }

    /// Log file path under `config_dir`, if file logging is configured.
    pub fn log_file_path(&self, config_dir: &Path) -> Option<PathBuf> {
        self.logging
            .file
            .as_ref()
            .map(|filename| config_dir.join(&self.logging.dir).join(filename))
    }

    pub fn log_summary(&self) {
        info!("Configuration loaded:");
        info!("  server: {}:{}", self.server.host, self.server.port);
        info!(
            "  lifecycle: startup={}s (poll {}ms), grace={}ms, kill={}ms, concurrency={:?}",
            self.lifecycle.startup_timeout_secs,
            self.lifecycle.ready_poll_interval_ms,
            self.lifecycle.shutdown_grace_ms,
            self.lifecycle.kill_timeout_ms,
            self.lifecycle.concurrency
        );

        match self.service.mode {
            ServiceMode::InProcess => info!(
                "  service: in-process, readiness={:?}",
                self.service.readiness
            ),
            ServiceMode::Process => info!(
                "  service: process '{}', readiness={:?}",
                self.service.binary, self.service.readiness
            ),
        }

        info!(
            "  logging: {} (file: {}, colored: {})",
            self.logging.level,
            self.logging.file.as_deref().unwrap_or("none"),
            self.logging.colored
        );
    }

    fn apply_env_overrides(&mut self) -> ConfigErrorResult<()> {
        // Server
        Self::apply_env_string("BRIDGE_SERVER_HOST", &mut self.server.host);
        Self::apply_env_parse("BRIDGE_SERVER_PORT", &mut self.server.port)?;

        // Lifecycle
        Self::apply_env_parse(
            "BRIDGE_STARTUP_TIMEOUT_SECS",
            &mut self.lifecycle.startup_timeout_secs,
        )?;
        Self::apply_env_parse(
            "BRIDGE_READY_POLL_INTERVAL_MS",
            &mut self.lifecycle.ready_poll_interval_ms,
        )?;
        Self::apply_env_parse(
            "BRIDGE_SHUTDOWN_GRACE_MS",
            &mut self.lifecycle.shutdown_grace_ms,
        )?;
        Self::apply_env_parse("BRIDGE_KILL_TIMEOUT_MS", &mut self.lifecycle.kill_timeout_ms)?;
        Self::apply_env_parse("BRIDGE_CONCURRENCY", &mut self.lifecycle.concurrency)?;

        // Service
        Self::apply_env_parse("BRIDGE_SERVICE_MODE", &mut self.service.mode)?;
        Self::apply_env_string("BRIDGE_SERVICE_BINARY", &mut self.service.binary);
        Self::apply_env_parse("BRIDGE_SERVICE_READINESS", &mut self.service.readiness)?;

        // Logging
        Self::apply_env_parse("BRIDGE_LOG_LEVEL", &mut self.logging.level)?;
        Self::apply_env_option_string("BRIDGE_LOG_FILE", &mut self.logging.file);
        Self::apply_env_bool("BRIDGE_LOG_COLORED", &mut self.logging.colored);

        Ok(())
    }

    fn apply_env_string(var_name: &str, target: &mut String) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val;
        }
    }

    /// Accepts "true"/"1"; anything else is false.
    fn apply_env_bool(var_name: &str, target: &mut bool) {
        if let Ok(val) = std::env::var(var_name) {
            *target = val == "true" || val == "1";
        }
    }

    /// Unlike the file, a malformed variable is an error rather than ignored.
    fn apply_env_parse<T>(var_name: &'static str, target: &mut T) -> ConfigErrorResult<()>
    where
        T: FromStr,
        T::Err: Display,
    {
        if let Ok(val) = std::env::var(var_name) {
            *target = val
                .parse()
                .map_err(|e: T::Err| ConfigError::env(var_name, e.to_string()))?;
        }
        Ok(())
    }

    fn apply_env_option_string(var_name: &str, target: &mut Option<String>) {
        if let Ok(val) = std::env::var(var_name) {
            *target = if val.is_empty() { None } else { Some(val) };
        }
    }
}
