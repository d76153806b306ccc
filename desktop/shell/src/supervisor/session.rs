//! The backend session: one spawned backend per application run.

use crate::supervisor::{
    BackendLauncher, ProcessTerminator, SessionState, SupervisorError, SupervisorResult,
};

use std::panic::Location;
use std::process::{Child, ExitStatus};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use bd_store::{KeyValueStore, keys};
use error_location::ErrorLocation;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const DEFAULT_HOST: &str = "localhost";
const REAP_TIMEOUT: Duration = Duration::from_secs(2);
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Base URL the UI uses to reach the backend.
pub fn endpoint_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}")
}

/// What a call to [`BackendSession::terminate`] actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// No process was tracked (never started, or already terminated)
    NotTracked,
    /// The process had already exited; no kill was sent
    AlreadyExited { pid: u32 },
    /// Kill issued and accepted
    Killed { pid: u32 },
    /// Kill issued but the OS reported an error; logged and swallowed
    KillFailed { pid: u32 },
}

impl TerminationOutcome {
    pub fn kill_issued(&self) -> bool {
        matches!(self, Self::Killed { .. } | Self::KillFailed { .. })
    }
}

#[derive(Default)]
struct SessionInner {
    port: Option<u16>,
    child: Option<Child>,
    endpoint: Option<String>,
}

/// Owns the backend process for the lifetime of one application run.
///
/// The session is the only component allowed to spawn or kill the backend.
/// Shutdown hooks receive it by `Arc` instead of reaching for shared state.
pub struct BackendSession {
    terminator: Box<dyn ProcessTerminator>,
    host: String,
    inner: Mutex<SessionInner>,
    state_tx: watch::Sender<SessionState>,
    state_rx: watch::Receiver<SessionState>,
}

impl BackendSession {
    pub fn new(terminator: Box<dyn ProcessTerminator>) -> Self {
        let (state_tx, state_rx) = watch::channel(SessionState::NotStarted);

        Self {
            terminator,
            host: DEFAULT_HOST.into(),
            inner: Mutex::new(SessionInner::default()),
            state_tx,
            state_rx,
        }
    }

    /// Override the host used in the published endpoint.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Mark the session as starting. Fails if it was already used.
    #[track_caller]
    pub fn begin_startup(&self) -> SupervisorResult<()> {
        self.transition(SessionState::Starting)
    }

    /// Spawn the backend bound to `port` and take ownership of the process.
    ///
    /// Returns the pid. On failure the session stays in `Starting`; the
    /// caller is expected to call [`abort_startup`](Self::abort_startup).
    #[track_caller]
    pub fn start_backend(&self, launcher: &BackendLauncher, port: u16) -> SupervisorResult<u32> {
        let location = Location::caller();
        let mut inner = self.lock_inner();

        let state = self.state();
        if state != SessionState::Starting {
            return Err(SupervisorError::InvalidTransition {
                from: state.as_str(),
                to: "running",
                location: ErrorLocation::from(location),
            });
        }

        let child = launcher.spawn(port)?;
        let pid = child.id();

        inner.child = Some(child);
        inner.port = Some(port);

        // Cannot fail: we checked for `Starting` under the same lock
        self.transition(SessionState::Running { port, pid })?;

        info!(
            "Backend started on port {port} (pid {pid}, {})",
            launcher.executable().display()
        );

        Ok(pid)
    }

    /// Write the endpoint under `apiEndpoint` so the UI can find the backend.
    ///
    /// Only allowed while the session owns a running process, so the store
    /// never points at a backend that was not spawned.
    pub fn publish_endpoint(&self, store: &dyn KeyValueStore) -> SupervisorResult<String> {
        let mut inner = self.lock_inner();

        let port = match (self.state(), inner.child.is_some()) {
            (SessionState::Running { port, .. }, true) => port,
            (state, _) => {
                return Err(SupervisorError::endpoint_unavailable(format!(
                    "session is {}",
                    state.as_str()
                )));
            }
        };

        let endpoint = endpoint_url(&self.host, port);
        store.set(keys::API_ENDPOINT, Value::String(endpoint.clone()))?;
        inner.endpoint = Some(endpoint.clone());

        info!("API endpoint set to: {endpoint}");

        Ok(endpoint)
    }

    /// Undo a failed startup: kill anything already spawned and end the session.
    pub fn abort_startup(&self) {
        self.terminate();

        if self.state() == SessionState::Starting {
            self.transition(SessionState::Terminated).ok();
        }
    }

    /// Kill the backend if the session still owns one.
    ///
    /// Safe to call any number of times from any exit path: the process is
    /// asked to die at most once, errors are logged and swallowed, and the
    /// session always ends up `Terminated` when a process was tracked.
    pub fn terminate(&self) -> TerminationOutcome {
        let mut inner = self.lock_inner();

        let Some(mut child) = inner.child.take() else {
            debug!("Terminate requested with no backend tracked");
            return TerminationOutcome::NotTracked;
        };
        let pid = child.id();

        self.transition(SessionState::Terminating).ok();

        let outcome = match child.try_wait() {
            Ok(Some(status)) => {
                info!("Backend (pid {pid}) had already exited: {status}");
                TerminationOutcome::AlreadyExited { pid }
            }
            _ => match self.terminator.terminate(pid) {
                Ok(()) => {
                    info!("Backend terminated via {} (pid {pid})", self.terminator.name());
                    TerminationOutcome::Killed { pid }
                }
                Err(e) => {
                    warn!("Failed to terminate backend: {e}");
                    TerminationOutcome::KillFailed { pid }
                }
            },
        };

        if outcome.kill_issued() && !reap(&mut child, REAP_TIMEOUT) {
            warn!("Backend (pid {pid}) did not exit within {REAP_TIMEOUT:?}");
        }

        inner.endpoint = None;
        self.transition(SessionState::Terminated).ok();

        outcome
    }

    /// Exit status of the backend if it has already died on its own.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.lock_inner()
            .child
            .as_mut()
            .and_then(|child| child.try_wait().ok().flatten())
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    pub fn port(&self) -> Option<u16> {
        self.lock_inner().port
    }

    pub fn pid(&self) -> Option<u32> {
        self.lock_inner().child.as_ref().map(Child::id)
    }

    /// Published endpoint, if the backend is still owned.
    pub fn endpoint(&self) -> Option<String> {
        self.lock_inner().endpoint.clone()
    }

    pub fn terminator_name(&self) -> &'static str {
        self.terminator.name()
    }

    fn lock_inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[track_caller]
    fn transition(&self, next: SessionState) -> SupervisorResult<()> {
        let location = Location::caller();
        let mut rejected_from = None;

        self.state_tx.send_if_modified(|current| {
            if current.can_transition_to(&next) {
                *current = next;
                true
            } else {
                rejected_from = Some(current.as_str());
                false
            }
        });

        match rejected_from {
            None => {
                debug!("Session state -> {}", next.as_str());
                Ok(())
            }
            Some(from) => {
                warn!("Rejected session transition {from} -> {}", next.as_str());
                Err(SupervisorError::InvalidTransition {
                    from,
                    to: next.as_str(),
                    location: ErrorLocation::from(location),
                })
            }
        }
    }
}

impl Drop for BackendSession {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn reap(child: &mut Child, timeout: Duration) -> bool {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(_)) => return true,
            Ok(None) if start.elapsed() < timeout => thread::sleep(REAP_POLL_INTERVAL),
            _ => return false,
        }
    }
}
