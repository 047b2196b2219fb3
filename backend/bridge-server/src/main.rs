use bridge_server::{AppState, ShutdownCoordinator, bind_loopback, build_router, logger, serve};

use std::error::Error;

use axum::Router;
use log::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load and validate configuration
    let config = bridge_config::Config::load()?;
    config.validate()?;

    let config_dir = bridge_config::Config::config_dir()?;
    logger::initialize(
        config.logging.level,
        config.log_file_path(&config_dir),
        config.logging.colored,
    )?;

    info!("Starting bridge-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let listener = bind_loopback(config.server.bind_addr()?).await?;
    let actual_addr = listener.local_addr()?;
    info!("Listening on {actual_addr}");

    let shutdown = ShutdownCoordinator::new();

    // Spawn signal handler for graceful shutdown
    let shutdown_for_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
                shutdown_for_signal.shutdown();
            }
            Err(e) => error!("Failed to listen for SIGINT: {e}"),
        }
    });

    #[cfg(unix)]
    {
        let shutdown_for_term = shutdown.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};

            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    if term.recv().await.is_some() {
                        info!("Received SIGTERM, initiating graceful shutdown");
                        shutdown_for_term.shutdown();
                    }
                }
                Err(e) => error!("Failed to listen for SIGTERM: {e}"),
            }
        });
    }

    #[cfg(windows)]
    {
        let shutdown_for_break = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::windows::ctrl_break() {
                Ok(mut ctrl_break) => {
                    if ctrl_break.recv().await.is_some() {
                        info!("Received CTRL_BREAK, initiating graceful shutdown");
                        shutdown_for_break.shutdown();
                    }
                }
                Err(e) => error!("Failed to listen for CTRL_BREAK: {e}"),
            }
        });
    }

    let router = build_router(AppState::new(shutdown.clone()), Router::new());
    serve(listener, router, shutdown).await?;

    info!("bridge-server exited cleanly");
    Ok(())
}
