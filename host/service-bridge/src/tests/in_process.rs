use crate::server::{
    InProcessLauncher, LoopbackAllocator, ReadinessProbe, ServerManager, ServerState,
};
use crate::tests::{accepts_connections, test_config};

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{Router, routing::get};
use bridge_config::ReadinessCheck;
use googletest::assert_that;
use googletest::prelude::eq;
use tokio::runtime::Runtime;

fn in_process_manager<F>(app: F) -> ServerManager
where
    F: Fn() -> Router + Send + Sync + 'static,
{
    let mut config = test_config();
    config.service.readiness = ReadinessCheck::Http;
    let probe = ReadinessProbe::new(&config.service, &config.lifecycle).unwrap();
    let launcher = InProcessLauncher::new(probe, config.lifecycle.kill_timeout()).with_app(app);

    ServerManager::with_parts(config, Arc::new(LoopbackAllocator), Arc::new(launcher)).unwrap()
}

fn http() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn get_status(rt: &Runtime, port: u16, path: &str) -> u16 {
    rt.block_on(async {
        http()
            .get(format!("http://127.0.0.1:{port}{path}"))
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    })
}

fn wait_until_refused(port: u16) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if !accepts_connections(port) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn given_started_when_ready_requested_then_ok_and_refused_after_stop() {
    let rt = Runtime::new().unwrap();
    let manager = in_process_manager(Router::new);

    let port = manager.start().unwrap();
    assert_that!(get_status(&rt, port, "/ready"), eq(200));
    assert_that!(get_status(&rt, port, "/live"), eq(200));

    manager.stop();

    assert_that!(manager.state(), eq(ServerState::Absent));
    assert!(!accepts_connections(port));
}

#[test]
fn given_host_routes_when_started_then_served_alongside_control_routes() {
    let rt = Runtime::new().unwrap();
    let manager = in_process_manager(|| Router::new().route("/ping", get(|| async { "pong" })));
    let port = manager.start().unwrap();

    let body = rt.block_on(async {
        http()
            .get(format!("http://127.0.0.1:{port}/ping"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap()
    });

    assert_that!(body, eq("pong"));
    manager.stop();
}

#[test]
fn given_request_in_flight_when_stop_then_forced_after_grace() {
    let rt = Runtime::new().unwrap();
    let manager = in_process_manager(|| {
        Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "done"
            }),
        )
    });
    let grace = manager.config().lifecycle.shutdown_grace();
    let port = manager.start().unwrap();

    let in_flight = rt.spawn(async move {
        http()
            .get(format!("http://127.0.0.1:{port}/slow"))
            .send()
            .await
    });
    std::thread::sleep(Duration::from_millis(200));

    let started = Instant::now();
    manager.stop();
    let elapsed = started.elapsed();

    assert!(elapsed >= grace, "stop returned after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "stop took {elapsed:?}");

    let response = rt
        .block_on(async { tokio::time::timeout(Duration::from_secs(5), in_flight).await })
        .unwrap()
        .unwrap();
    assert!(response.is_err(), "in-flight request should be cut off");
    assert!(!accepts_connections(port));
}

#[test]
fn given_service_shut_down_externally_when_start_then_relaunched() {
    let rt = Runtime::new().unwrap();
    let manager = in_process_manager(Router::new);
    let first = manager.start().unwrap();

    let status = rt.block_on(async {
        http()
            .post(format!("http://127.0.0.1:{first}/admin/shutdown"))
            .send()
            .await
            .unwrap()
            .status()
            .as_u16()
    });
    assert_that!(status, eq(202));
    assert!(wait_until_refused(first));

    let second = manager.start().unwrap();

    assert_that!(get_status(&rt, second, "/ready"), eq(200));
    assert_that!(manager.state(), eq(ServerState::Running { port: second }));
    manager.stop();
}
