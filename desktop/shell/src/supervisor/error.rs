use std::panic::Location;
use std::path::PathBuf;

use bd_store::StoreError;
use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Failed to allocate a free port: {source} {location}")]
    PortAllocation {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Backend executable not found at {path} {location}")]
    BackendNotFound {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Failed to launch backend {path}: {source} {location}")]
    BackendLaunch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Backend endpoint cannot be published: {message} {location}")]
    EndpointUnavailable {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid session transition from {from} to {to} {location}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
        location: ErrorLocation,
    },

    #[error("Backend did not answer within {timeout_secs}s {location}")]
    StartupTimeout {
        timeout_secs: u64,
        location: ErrorLocation,
    },

    #[error("Backend exited during startup with status {status} {location}")]
    BackendExited {
        status: String,
        location: ErrorLocation,
    },

    #[error("Failed to terminate backend (pid {pid}): {message} {location}")]
    Termination {
        pid: u32,
        message: String,
        location: ErrorLocation,
    },

    #[error("Configuration invalid: {message} {location}")]
    ConfigInvalid {
        message: String,
        location: ErrorLocation,
    },

    #[error("Failed to acquire instance lock at {path}: {source} {location}")]
    LockAcquisition {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("Store error: {source}")]
    Store {
        #[source]
        source: StoreError,
        location: ErrorLocation,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("HTTP error: {source} {location}")]
    Http {
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },
}

impl SupervisorError {
    #[track_caller]
    pub fn termination(pid: u32, message: impl Into<String>) -> Self {
        Self::Termination {
            pid,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn endpoint_unavailable(message: impl Into<String>) -> Self {
        Self::EndpointUnavailable {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether this error is recoverable via retry
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::PortAllocation { .. }
                | Self::StartupTimeout { .. }
                | Self::Http { .. }
                | Self::Io { .. }
        )
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::PortAllocation { .. } => {
                "The system refused to provide a network port. \
                   Close other applications or restart your computer."
            }
            Self::BackendNotFound { .. } => {
                "The application installation appears incomplete. \
                   Please reinstall Brief Desk."
            }
            Self::BackendLaunch { .. } => {
                "The backend could not be started. \
                   Check that it is not blocked by antivirus software and is executable."
            }
            Self::StartupTimeout { .. } => {
                "The backend is taking too long to start. \
                   Try restarting the application or check the logs."
            }
            Self::BackendExited { .. } => {
                "The backend stopped right after starting. \
                   Check the logs for details."
            }
            Self::ConfigInvalid { .. } => {
                "Configuration file has invalid settings. \
                   Check the logs for details or delete the config file to use defaults."
            }
            Self::LockAcquisition { .. } => {
                "Unable to create lock file. \
                   Check file permissions in the application directory."
            }
            Self::Store { source, .. } => source.recovery_hint(),
            _ => "An unexpected error occurred. Please check the logs for details.",
        }
    }
}

impl From<std::io::Error> for SupervisorError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<reqwest::Error> for SupervisorError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<StoreError> for SupervisorError {
    #[track_caller]
    fn from(source: StoreError) -> Self {
        Self::Store {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
