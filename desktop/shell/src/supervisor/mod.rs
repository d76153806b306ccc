mod config;
mod error;
mod launch;
mod lock;
mod port;
mod readiness;
mod session;
mod session_state;
mod terminator;

pub use config::{
    BackendSettings, CONFIG_FILENAME, CONFIG_VERSION, LoggingSettings, ReadinessSettings,
    SupervisorConfig,
};
pub use error::{Result as SupervisorResult, SupervisorError};
pub use launch::BackendLauncher;
pub use lock::{
    InstanceLock, LockStatus, SECOND_INSTANCE_MESSAGE, is_process_running, notify_primary,
};
pub use port::PortAllocator;
pub use readiness::ReadinessProbe;
pub use session::{BackendSession, TerminationOutcome, endpoint_url};
pub use session_state::SessionState;
#[cfg(unix)]
pub use terminator::SignalTerminator;
pub use terminator::{ProcessTerminator, TreeKillTerminator, platform_terminator};

#[cfg(test)]
pub(crate) use lock::LockInfo;
#[cfg(test)]
pub(crate) use terminator::tree_kill_args;
