/// Observable lifecycle state of the managed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerState {
    /// No service is running
    #[default]
    Absent,
    /// A start is in progress
    Starting,
    /// Service is accepting connections on `port`
    Running { port: u16 },
    /// A stop is in progress
    Stopping,
}

impl ServerState {
    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Running { port } => Some(*port),
            _ => None,
        }
    }
}
