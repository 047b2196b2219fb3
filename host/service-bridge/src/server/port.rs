//! Loopback port reservation.
//!
//! A reservation keeps its listener bound until it is handed to a launcher,
//! so no other process can take the port between allocation and launch.

use crate::server::{LifecycleError, LifecycleResult};

use std::net::{IpAddr, SocketAddr, TcpListener};
use std::panic::Location;

use error_location::ErrorLocation;
use tracing::debug;

/// Source of loopback ports for new service instances.
pub trait PortAllocator: Send + Sync {
    /// Reserve `addr`; port `0` asks the OS for any free port.
    fn reserve(&self, addr: SocketAddr) -> LifecycleResult<ReservedPort>;
}

/// Binds the requested loopback address directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackAllocator;

impl PortAllocator for LoopbackAllocator {
    fn reserve(&self, addr: SocketAddr) -> LifecycleResult<ReservedPort> {
        ReservedPort::bind(addr)
    }
}

/// A bound, not yet serving, loopback listener.
#[derive(Debug)]
pub struct ReservedPort {
    listener: TcpListener,
    addr: SocketAddr,
}

impl ReservedPort {
    #[track_caller]
    pub fn bind(addr: SocketAddr) -> LifecycleResult<Self> {
        let caller = Location::caller();
        if !addr.ip().is_loopback() {
            return Err(LifecycleError::NotLoopback {
                host: addr.ip(),
                location: ErrorLocation::from(caller),
            });
        }

        let port_error = |host: IpAddr, source: std::io::Error| LifecycleError::PortAllocation {
            host,
            source,
            location: ErrorLocation::from(caller),
        };

        let listener = TcpListener::bind(addr).map_err(|e| port_error(addr.ip(), e))?;
        let bound = listener.local_addr().map_err(|e| port_error(addr.ip(), e))?;

        if bound.port() == 0 {
            return Err(port_error(
                addr.ip(),
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "OS assigned port 0",
                ),
            ));
        }

        debug!(%bound, "Reserved loopback port");
        Ok(Self {
            listener,
            addr: bound,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Hand the bound listener to an in-process server.
    pub fn into_listener(self) -> TcpListener {
        self.listener
    }

    /// Close the listener so another process can bind the address.
    pub fn release(self) -> SocketAddr {
        debug!(addr = %self.addr, "Releasing reserved port");
        self.addr
    }
}
