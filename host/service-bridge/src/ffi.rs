//! C ABI control surface.
//!
//! ```c
//! int32_t bridge_start_server(uint16_t *out_port);
//! void bridge_stop_server(void);
//! ```

use crate::server::ErrorCode;

use tracing::error;

/// Start the embedded service and publish its loopback port.
///
/// Returns `0` and writes the port to `out_port` on success. Returns a
/// negative [`ErrorCode`] and leaves `out_port` untouched on failure.
///
/// # Safety
///
/// `out_port` must be null or valid for a write of one `u16`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn bridge_start_server(out_port: *mut u16) -> i32 {
    if out_port.is_null() {
        error!("bridge_start_server called with a null out_port");
        return ErrorCode::InternalFailure.as_raw();
    }

    let (code, port) = crate::start().into_raw();
    if let Some(port) = port {
        // SAFETY: non-null and valid for writes per the caller contract.
        unsafe { out_port.write(port) };
    }
    code
}

/// Stop the embedded service. Safe to call at any time, any number of times.
#[unsafe(no_mangle)]
pub extern "C" fn bridge_stop_server() {
    crate::stop();
}
