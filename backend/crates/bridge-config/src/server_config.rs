use crate::{ConfigError, ConfigErrorResult, DEFAULT_HOST, DEFAULT_PORT, LOCALHOST};

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface the service binds to. Must be a loopback address.
    pub host: String,
    /// Fixed port for the standalone binary. 0 lets the OS choose.
    /// The lifecycle manager ignores this and always asks for an ephemeral port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        self.loopback_ip().map(|_| ())
    }

    /// Resolve `host` to a loopback IP.
    ///
    /// `localhost` maps to `127.0.0.1` without touching the resolver; anything
    /// else must parse as an IP literal for which `is_loopback()` holds.
    pub fn loopback_ip(&self) -> ConfigErrorResult<IpAddr> {
        let host = self.host.trim();
        if host.eq_ignore_ascii_case(LOCALHOST) {
            return Ok(IpAddr::V4(Ipv4Addr::LOCALHOST));
        }

        let ip: IpAddr = host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|_| {
                ConfigError::server(format!(
                    "server.host must be a loopback IP or 'localhost', got '{}'",
                    self.host
                ))
            })?;

        if !ip.is_loopback() {
            return Err(ConfigError::server(format!(
                "server.host must be a loopback address, got {ip}"
            )));
        }

        Ok(ip)
    }

    /// Socket address for the standalone binary (`host:port`).
    pub fn bind_addr(&self) -> ConfigErrorResult<SocketAddr> {
        Ok(SocketAddr::new(self.loopback_ip()?, self.port))
    }
}
