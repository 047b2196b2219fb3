use std::fmt;

/// Status codes returned by the start operation. Success is `0`; every
/// failure is a distinct negative value.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// No free loopback port could be reserved
    PortAllocationFailure = -1,
    /// The service could not be brought up or never became ready
    ServiceInitFailure = -2,
    /// Another start was in flight and the policy is `reject`
    AlreadyInProgress = -3,
    /// Anything else: bad configuration, runtime setup, a caught panic
    InternalFailure = -4,
}

impl ErrorCode {
    pub const SUCCESS: i32 = 0;

    pub const ALL: [ErrorCode; 4] = [
        Self::PortAllocationFailure,
        Self::ServiceInitFailure,
        Self::AlreadyInProgress,
        Self::InternalFailure,
    ];

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_raw() == raw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PortAllocationFailure => "port_allocation_failure",
            Self::ServiceInitFailure => "service_init_failure",
            Self::AlreadyInProgress => "already_in_progress",
            Self::InternalFailure => "internal_failure",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.as_raw())
    }
}
