//! Platform-specific backend termination.
//!
//! A plain kill on Windows does not reach the processes the backend spawns
//! itself (browser drivers), so the Windows terminator kills the whole tree.

use crate::supervisor::{SupervisorError, SupervisorResult};

use std::process::{Command, Stdio};

#[cfg(windows)]
use std::os::windows::process::CommandExt;

/// Kills a backend process by pid.
///
/// Selected once at startup by [`platform_terminator`]. Implementations only
/// issue the kill; reaping and state bookkeeping belong to the session.
pub trait ProcessTerminator: Send + Sync {
    fn name(&self) -> &'static str;

    fn terminate(&self, pid: u32) -> SupervisorResult<()>;
}

/// `taskkill /pid <pid> /f /t`, run synchronously.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeKillTerminator;

impl ProcessTerminator for TreeKillTerminator {
    fn name(&self) -> &'static str {
        "taskkill"
    }

    fn terminate(&self, pid: u32) -> SupervisorResult<()> {
        let mut command = Command::new("taskkill");
        command
            .args(tree_kill_args(pid))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use windows_sys::Win32::System::Threading::CREATE_NO_WINDOW;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let status = command
            .status()
            .map_err(|e| SupervisorError::termination(pid, format!("taskkill failed to run: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(SupervisorError::termination(
                pid,
                format!("taskkill returned {status}"),
            ))
        }
    }
}

pub(crate) fn tree_kill_args(pid: u32) -> [String; 4] {
    ["/pid".into(), pid.to_string(), "/f".into(), "/t".into()]
}

/// Sends `SIGKILL` directly to the tracked pid.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalTerminator;

#[cfg(unix)]
impl ProcessTerminator for SignalTerminator {
    fn name(&self) -> &'static str {
        "SIGKILL"
    }

    fn terminate(&self, pid: u32) -> SupervisorResult<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let raw = i32::try_from(pid)
            .map_err(|_| SupervisorError::termination(pid, "pid out of range"))?;

        kill(Pid::from_raw(raw), Signal::SIGKILL)
            .map_err(|errno| SupervisorError::termination(pid, errno.desc()))
    }
}

/// The terminator for the platform we are running on.
pub fn platform_terminator() -> Box<dyn ProcessTerminator> {
    #[cfg(windows)]
    {
        Box::new(TreeKillTerminator)
    }

    #[cfg(unix)]
    {
        Box::new(SignalTerminator)
    }
}
