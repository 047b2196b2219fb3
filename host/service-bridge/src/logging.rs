//! Host-side logging setup.
//!
//! Installs a global subscriber unless the host already has one. Records
//! from the `log` facade (the embedded service) are bridged into it.

use std::path::Path;

use bridge_config::Config;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

const MAX_LOG_FILES: usize = 7;

/// Setup logging with console and optional rotating file output.
///
/// # Log Layers
/// - Console: stderr, colored when `logging.colored` is set
/// - File: `<config_dir>/<logging.dir>/<logging.file>.<date>`, daily rotation
///
/// `RUST_LOG` overrides `logging.level`. Returns `Ok(false)` when another
/// subscriber was already installed.
pub fn setup_logging(config: &Config, config_dir: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(config.logging.colored)
        .with_writer(std::io::stderr);

    let file_layer = match config.log_file_path(config_dir) {
        Some(path) => {
            let (Some(dir), Some(prefix)) = (path.parent(), path.file_name()) else {
                return Err(format!("invalid log file path {}", path.display()).into());
            };
            std::fs::create_dir_all(dir)?;

            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .max_log_files(MAX_LOG_FILES)
                .filename_prefix(prefix.to_string_lossy())
                .build(dir)?;

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(false)
                    .with_writer(file_appender),
            )
        }
        None => None,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    Ok(installed)
}
