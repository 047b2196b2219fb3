use crate::{ServerError, ServerResult};

use std::fmt::{Arguments, Display};
use std::path::PathBuf;
use std::time::SystemTime;

use bridge_config::LogLevel;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{Record, info};

/// Initialize the fern logger.
///
/// # Arguments
/// * `log_level` - Log level filter
/// * `log_file` - Optional path to log file. None = stderr, Some = file output
/// * `colored` - Enable colored output (ignored when logging to file)
pub fn initialize(
    log_level: LogLevel,
    log_file: Option<PathBuf>,
    colored: bool,
) -> ServerResult<()> {
    let base = Dispatch::new().level(log_level.into());

    let output = match log_file {
        Some(ref log_path) => {
            if let Some(dir) = log_path.parent() {
                std::fs::create_dir_all(dir).map_err(|e| ServerError::Logger {
                    message: format!("Failed to create log directory {}: {e}", dir.display()),
                })?;
            }

            let file = fern::log_file(log_path).map_err(|e| ServerError::Logger {
                message: format!("Failed to open log file {}: {e}", log_path.display()),
            })?;

            Dispatch::new()
                .format(|out, message, record| finish(out, message, record, record.level()))
                .chain(file)
        }
        None if colored => {
            let colors = ColoredLevelConfig::new()
                .trace(Color::Magenta)
                .debug(Color::Blue)
                .info(Color::Green)
                .warn(Color::Yellow)
                .error(Color::Red);

            Dispatch::new()
                .format(move |out, message, record| {
                    finish(out, message, record, colors.color(record.level()))
                })
                .chain(std::io::stderr())
        }
        // Plain output for non-TTY (captured by a supervising host)
        None => Dispatch::new()
            .format(|out, message, record| finish(out, message, record, record.level()))
            .chain(std::io::stderr()),
    };

    base.chain(output).apply().map_err(|e| ServerError::Logger {
        message: format!("Failed to initialize logger: {e}"),
    })?;

    match log_file {
        Some(ref path) => info!(
            "Logger initialized: level={log_level}, file={}",
            path.display()
        ),
        None => info!("Logger initialized: level={log_level}, stderr"),
    }

    Ok(())
}

fn finish(out: FormatCallback<'_>, message: &Arguments<'_>, record: &Record<'_>, level: impl Display) {
    out.finish(format_args!(
        "[{date} - {level}] {message} [{file}:{line}]",
        date = humantime::format_rfc3339(SystemTime::now()),
        file = record.file().unwrap_or("unknown"),
        line = record.line().unwrap_or(0),
    ))
}
