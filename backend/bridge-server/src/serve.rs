use crate::{ServerError, ServerResult, ShutdownCoordinator};

use std::net::SocketAddr;

use axum::Router;
use log::info;
use tokio::net::TcpListener;

/// Bind a listener, refusing anything but a loopback interface.
pub async fn bind_loopback(addr: SocketAddr) -> ServerResult<TcpListener> {
    if !addr.ip().is_loopback() {
        return Err(ServerError::NotLoopback { addr });
    }

    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve `router` on an already-bound listener until `shutdown` fires.
///
/// Returns once the accept loop has stopped and in-flight requests finished.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: ShutdownCoordinator,
) -> ServerResult<()> {
    let local_addr = listener.local_addr().map_err(ServerError::Serve)?;
    info!("Serving on {local_addr}");

    let mut guard = shutdown.subscribe_guard();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            guard.wait().await;
        })
        .await
        .map_err(ServerError::Serve)?;

    info!("Server on {local_addr} stopped");
    Ok(())
}
