use crate::server::{LifecycleError, LifecycleResult, ReadinessProbe, ServiceInstance};
use crate::tests::test_config;

use std::net::{SocketAddr, TcpListener};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bridge_config::ReadinessCheck;

/// Instance at a fixed address that never serves anything itself.
struct Silent {
    addr: SocketAddr,
    exited: bool,
}

#[async_trait]
impl ServiceInstance for Silent {
    fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn describe(&self) -> String {
        String::from("silent")
    }

    fn has_exited(&mut self) -> bool {
        self.exited
    }

    async fn request_shutdown(&mut self) -> LifecycleResult<()> {
        Ok(())
    }

    async fn wait_exited(&mut self) {}

    async fn kill(&mut self) -> LifecycleResult<()> {
        Ok(())
    }
}

fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn probe(check: ReadinessCheck, timeout_secs: u64) -> ReadinessProbe {
    let mut config = test_config();
    config.service.readiness = check;
    config.lifecycle.startup_timeout_secs = timeout_secs;
    ReadinessProbe::new(&config.service, &config.lifecycle).unwrap()
}

#[tokio::test]
async fn given_bound_listener_when_tcp_probe_then_ready() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();

    let result = probe(ReadinessCheck::Tcp, 5)
        .probe(listener.local_addr().unwrap())
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn given_closed_port_when_tcp_probe_then_not_ready() {
    let result = probe(ReadinessCheck::Tcp, 5).probe(closed_port()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn given_tcp_listener_without_http_when_http_probe_then_not_ready() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let result = probe(ReadinessCheck::Http, 5).probe(addr).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn given_never_ready_when_wait_ready_then_startup_timeout() {
    let mut instance = Silent {
        addr: closed_port(),
        exited: false,
    };

    let started = Instant::now();
    let result = probe(ReadinessCheck::Tcp, 1).wait_ready(&mut instance).await;

    assert!(matches!(result, Err(LifecycleError::StartupTimeout { .. })));
    assert!(started.elapsed() >= Duration::from_secs(1));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn given_exited_instance_when_wait_ready_then_fails_without_waiting() {
    let mut instance = Silent {
        addr: closed_port(),
        exited: true,
    };

    let started = Instant::now();
    let result = probe(ReadinessCheck::Tcp, 5).wait_ready(&mut instance).await;

    assert!(matches!(result, Err(LifecycleError::ServiceExited { .. })));
    assert!(started.elapsed() < Duration::from_secs(1));
}
