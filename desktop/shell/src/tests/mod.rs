mod hooks;
mod paths;
mod readiness;
mod session;

use crate::host::UiShell;
use crate::supervisor::{
    BackendLauncher, ProcessTerminator, SupervisorError, SupervisorResult,
};

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// RAII guard for environment variables - automatically restores on drop
pub(crate) struct EnvGuard {
    key: &'static str,
    original: Option<String>,
}

impl EnvGuard {
    pub(crate) fn set(key: &'static str, value: &str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self { key, original }
        }
    }

    pub(crate) fn remove(key: &'static str) -> Self {
        unsafe {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self { key, original }
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        unsafe {
            match &self.original {
                Some(val) => env::set_var(self.key, val),
                None => env::remove_var(self.key),
            }
        }
    }
}

/// Stand-in backend: `sleep <port>` stays alive long enough to be killed.
#[cfg(unix)]
pub(crate) fn sleep_launcher() -> BackendLauncher {
    let executable = ["/bin/sleep", "/usr/bin/sleep"]
        .into_iter()
        .map(Path::new)
        .find(|path| path.is_file())
        .expect("sleep binary available");
    BackendLauncher::new(executable)
}

pub(crate) fn missing_launcher(dir: &Path) -> BackendLauncher {
    BackendLauncher::new(dir.join("no-such-backend"))
}

/// Delegates to the real platform kill and counts calls.
pub(crate) struct CountingTerminator {
    calls: Arc<AtomicUsize>,
    inner: Box<dyn ProcessTerminator>,
}

impl CountingTerminator {
    pub(crate) fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let terminator = Self {
            calls: calls.clone(),
            inner: crate::supervisor::platform_terminator(),
        };
        (terminator, calls)
    }
}

impl ProcessTerminator for CountingTerminator {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn terminate(&self, pid: u32) -> SupervisorResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.terminate(pid)
    }
}

/// Always fails, as taskkill does for a pid that vanished.
pub(crate) struct FailingTerminator;

impl ProcessTerminator for FailingTerminator {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn terminate(&self, pid: u32) -> SupervisorResult<()> {
        Err(SupervisorError::termination(pid, "process not found"))
    }
}

/// Records what the host asked the window layer to do.
#[derive(Default)]
pub(crate) struct RecordingShell {
    pub(crate) windows: Vec<String>,
    pub(crate) focus_requests: usize,
    pub(crate) failures: Vec<String>,
}

impl UiShell for RecordingShell {
    fn show_main_window(&mut self, endpoint: &str) {
        self.windows.push(endpoint.to_owned());
    }

    fn focus_main_window(&mut self) {
        self.focus_requests += 1;
    }

    fn show_startup_failure(&mut self, error: &SupervisorError) {
        self.failures.push(error.to_string());
    }
}
