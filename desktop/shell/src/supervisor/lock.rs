//! Lock file for single-instance enforcement.

use crate::supervisor::{SupervisorError, SupervisorResult};

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;

const LOCK_FILENAME: &str = "instance.lock";
#[cfg(unix)]
const LOCK_FILE_MODE: u32 = 0o600; // Owner read/write only
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(2);

/// Sent by a second launch to the primary's loopback port.
pub const SECOND_INSTANCE_MESSAGE: &[u8] = b"brief-desk:second-instance\n";

/// Result of trying to become the primary instance.
pub enum LockStatus {
    /// We are the primary instance; keep the lock alive for the whole run
    Acquired(InstanceLock),
    /// Another live instance owns the lock
    HeldBy { pid: u32, port: Option<u16> },
}

/// Lock file held by the primary application instance.
///
/// Contains the owner's pid, so a lock left behind by a crash can be
/// recognised as stale, and the loopback port a second launch connects to.
pub struct InstanceLock {
    path: PathBuf,
    file: Option<File>,
    listener: Option<TcpListener>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LockInfo {
    pub(crate) pid: u32,
    pub(crate) started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) port: Option<u16>,
}

impl InstanceLock {
    /// Try to become the primary instance.
    ///
    /// A lock whose pid is no longer running is removed and taken over.
    #[track_caller]
    pub fn acquire(data_dir: &Path) -> SupervisorResult<LockStatus> {
        let location = Location::caller();
        let path = data_dir.join(LOCK_FILENAME);

        if path.exists()
            && let Some(existing) = Self::read_lock_info(&path)
        {
            if existing.pid != std::process::id() && is_process_running(existing.pid) {
                return Ok(LockStatus::HeldBy {
                    pid: existing.pid,
                    port: existing.port,
                });
            }
            info!(
                "Removing stale instance lock (PID {} not running)",
                existing.pid
            );
            std::fs::remove_file(&path).ok();
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(LOCK_FILE_MODE);

        let file = options
            .open(&path)
            .map_err(|source| SupervisorError::LockAcquisition {
                path: path.clone(),
                source,
                location: ErrorLocation::from(location),
            })?;

        let listener = match TcpListener::bind((Ipv4Addr::LOCALHOST, 0)) {
            Ok(listener) => Some(listener),
            Err(e) => {
                warn!("Second launches cannot reach this instance: {e}");
                None
            }
        };

        let mut lock = Self {
            path,
            file: Some(file),
            listener,
        };
        lock.write_info()?;

        Ok(LockStatus::Acquired(lock))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loopback port of the second-instance listener, until it is taken.
    pub fn port(&self) -> Option<u16> {
        self.listener
            .as_ref()
            .and_then(|l| l.local_addr().ok())
            .map(|addr| addr.port())
    }

    /// Hand the second-instance listener to whoever accepts on it.
    pub fn take_listener(&mut self) -> Option<TcpListener> {
        self.listener.take()
    }

    fn write_info(&mut self) -> SupervisorResult<()> {
        let info = LockInfo {
            pid: std::process::id(),
            started_at: chrono::Utc::now().to_rfc3339(),
            port: self.port(),
        };

        let content = serde_json::to_string_pretty(&info)
            .map_err(|e| SupervisorError::config_invalid(e.to_string()))?;

        if let Some(ref mut file) = self.file {
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        Ok(())
    }

    /// Unreadable or malformed locks count as stale.
    pub(crate) fn read_lock_info(path: &Path) -> Option<LockInfo> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Release the lock file.
    pub fn release(&mut self) {
        if self.file.take().is_some() {
            std::fs::remove_file(&self.path).ok();
        }
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// Check if a process with given PID is running.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    if raw <= 0 {
        return false;
    }
    // No signal is delivered; EPERM still means the pid exists.
    match nix::sys::signal::kill(Pid::from_raw(raw), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Check if a process with given PID is running (Windows).
#[cfg(windows)]
pub fn is_process_running(pid: u32) -> bool {
    use windows_sys::Win32::Foundation::{CloseHandle, STILL_ACTIVE};
    use windows_sys::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION,
    };

    // SAFETY: the handle is checked for null and closed before returning.
    unsafe {
        let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
        if handle.is_null() {
            return false;
        }

        let mut exit_code: u32 = 0;
        let result = GetExitCodeProcess(handle, &mut exit_code);
        CloseHandle(handle);

        result != 0 && exit_code == STILL_ACTIVE as u32
    }
}

/// Ask the primary instance to bring its window forward.
///
/// The primary listens on the loopback `port` from its lock file. Locks
/// written without a port fall back to `SIGUSR1` on unix.
pub fn notify_primary(pid: u32, port: Option<u16>) -> SupervisorResult<()> {
    match port {
        Some(port) => {
            let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
            let mut stream = TcpStream::connect_timeout(&addr, NOTIFY_TIMEOUT)?;
            stream.write_all(SECOND_INSTANCE_MESSAGE)?;
            stream.flush()?;
            info!("Notified primary instance (PID {pid}) on port {port}");
            Ok(())
        }
        None => signal_primary(pid),
    }
}

#[cfg(unix)]
fn signal_primary(pid: u32) -> SupervisorResult<()> {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "pid out of range")
    })?;
    kill(Pid::from_raw(raw), Signal::SIGUSR1).map_err(std::io::Error::from)?;

    Ok(())
}

#[cfg(windows)]
fn signal_primary(pid: u32) -> SupervisorResult<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("primary instance (PID {pid}) did not record a notification port"),
    )
    .into())
}
