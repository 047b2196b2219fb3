mod error;
mod error_code;
mod in_process;
mod launcher;
mod lifecycle;
mod port;
mod process;
mod readiness;
mod server_state;
mod start_result;

pub use error::{LifecycleError, Result as LifecycleResult};
pub use error_code::ErrorCode;
pub use in_process::{AppFactory, InProcessInstance, InProcessLauncher};
pub use launcher::{ServiceInstance, ServiceLauncher, discard_unready};
pub use lifecycle::ServerManager;
pub use port::{LoopbackAllocator, PortAllocator, ReservedPort};
pub use process::{ProcessInstance, ProcessLauncher};
pub use readiness::ReadinessProbe;
pub use server_state::ServerState;
pub use start_result::StartResult;
