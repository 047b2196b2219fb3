//! End-to-end tests over a real loopback socket.

use bridge_server::{AppState, ServerError, ShutdownCoordinator, bind_loopback, build_router, serve};

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use googletest::assert_that;
use googletest::prelude::eq;
use tokio::task::JoinHandle;

async fn start_server() -> (SocketAddr, ShutdownCoordinator, JoinHandle<()>) {
    let listener = bind_loopback("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = ShutdownCoordinator::new();
    let router = build_router(AppState::new(shutdown.clone()), Router::new());

    let coordinator = shutdown.clone();
    let handle = tokio::spawn(async move {
        serve(listener, router, coordinator).await.unwrap();
    });

    (addr, shutdown, handle)
}

#[tokio::test]
async fn given_served_router_when_ready_requested_then_ok() {
    let (addr, shutdown, handle) = start_server().await;

    let response = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
        .get(format!("http://{addr}/ready"))
        .send()
        .await
        .unwrap();

    assert_that!(response.status().as_u16(), eq(200));
    shutdown.shutdown();
    handle.await.unwrap();
}

#[tokio::test]
async fn given_admin_shutdown_when_posted_then_serve_returns_and_port_released() {
    let (addr, _shutdown, handle) = start_server().await;

    let response = reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap()
        .post(format!("http://{addr}/admin/shutdown"))
        .send()
        .await
        .unwrap();
    assert_that!(response.status().as_u16(), eq(202));

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("serve should return after shutdown")
        .unwrap();

    let probe = tokio::net::TcpStream::connect(addr).await;
    assert!(probe.is_err(), "port should refuse connections after shutdown");
}

#[tokio::test]
async fn given_non_loopback_addr_when_bind_then_rejected() {
    let result = bind_loopback("0.0.0.0:0".parse().unwrap()).await;

    assert!(matches!(result, Err(ServerError::NotLoopback { .. })));
}

#[tokio::test]
async fn given_port_in_use_when_bind_then_bind_error() {
    let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = held.local_addr().unwrap();

    let result = bind_loopback(addr).await;

    assert!(matches!(result, Err(ServerError::Bind { .. })));
}
