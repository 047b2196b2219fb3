//! Embedded loopback service lifecycle.
//!
//! The host calls [`start`] to get a ready service on an ephemeral loopback
//! port and [`stop`] to tear it down. The same pair is exported over the C
//! ABI in [`ffi`].

pub mod ffi;
pub mod logging;
pub mod server;

mod global;

#[cfg(test)]
mod tests;

pub use global::{start, stop};
pub use server::{
    ErrorCode, LifecycleError, LifecycleResult, ServerManager, ServerState, StartResult,
};
