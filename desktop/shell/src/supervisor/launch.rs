//! Backend executable resolution and spawning.

use crate::paths::AppPaths;
use crate::supervisor::{BackendSettings, SupervisorError, SupervisorResult};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use error_location::ErrorLocation;
use tracing::info;

pub struct BackendLauncher {
    executable: PathBuf,
}

impl BackendLauncher {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Pick the backend executable.
    ///
    /// Search order:
    /// 1. `backend.executable` from the config file
    /// 2. The location for the current build mode (packaged or development)
    pub fn resolve(settings: &BackendSettings, paths: &AppPaths) -> Self {
        match settings.executable {
            Some(ref executable) => {
                info!("Using backend (configured): {}", executable.display());
                Self::new(executable)
            }
            None => {
                let executable = paths.backend_executable();
                info!(
                    "Using backend ({}): {}",
                    paths.mode().as_str(),
                    executable.display()
                );
                Self::new(executable)
            }
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Spawn `<executable> <port>` detached from our process group.
    ///
    /// Standard streams are discarded; the backend keeps its own log file.
    #[track_caller]
    pub fn spawn(&self, port: u16) -> SupervisorResult<Child> {
        let location = Location::caller();

        if !self.executable.is_file() {
            return Err(SupervisorError::BackendNotFound {
                path: self.executable.clone(),
                location: ErrorLocation::from(location),
            });
        }

        let mut cmd = Command::new(&self.executable);
        cmd.arg(port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Detach on Unix
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // SAFETY: setsid is async-signal-safe and touches no parent state.
            unsafe {
                cmd.pre_exec(|| {
                    libc::setsid();
                    Ok(())
                });
            }
        }

        // Detach and hide the console window on Windows
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            use windows_sys::Win32::System::Threading::{
                CREATE_NEW_PROCESS_GROUP, CREATE_NO_WINDOW,
            };
            cmd.creation_flags(CREATE_NO_WINDOW | CREATE_NEW_PROCESS_GROUP);
        }

        cmd.spawn().map_err(|source| SupervisorError::BackendLaunch {
            path: self.executable.clone(),
            source,
            location: ErrorLocation::from(location),
        })
    }
}
