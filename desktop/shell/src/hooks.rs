//! Exit-path hooks.
//!
//! Every way the application can end is an [`ExitTrigger`]. All of them are
//! routed to the same session, which makes termination idempotent; the
//! first trigger kills the backend and the rest find nothing to do.

use crate::supervisor::{BackendSession, TerminationOutcome};

use std::sync::Arc;

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    /// The main window was closed by the user
    WindowClosed,
    /// The last window went away
    AllWindowsClosed,
    /// Quit was requested; windows are about to close
    BeforeQuit,
    /// The application is quitting
    Quit,
    /// The host process is exiting
    ProcessExit,
    /// SIGINT / Ctrl+C
    Interrupt,
    /// SIGTERM
    Terminate,
    /// The user launched the application again
    SecondInstance,
}

impl ExitTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WindowClosed => "window-closed",
            Self::AllWindowsClosed => "window-all-closed",
            Self::BeforeQuit => "before-quit",
            Self::Quit => "quit",
            Self::ProcessExit => "process-exit",
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::SecondInstance => "second-instance",
        }
    }
}

/// What the host should do after a hook ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
    /// Backend is gone; leave the event loop
    Quit,
    /// Nothing changed; keep running
    Continue,
    /// Reuse the existing window instead of starting anything
    FocusWindow,
}

#[derive(Clone)]
pub struct ShutdownHooks {
    session: Arc<BackendSession>,
    keep_running_without_windows: bool,
}

impl ShutdownHooks {
    /// Hooks for the current platform. macOS apps stay alive with no windows open.
    pub fn new(session: Arc<BackendSession>) -> Self {
        Self::with_platform_policy(session, cfg!(target_os = "macos"))
    }

    pub fn with_platform_policy(
        session: Arc<BackendSession>,
        keep_running_without_windows: bool,
    ) -> Self {
        Self {
            session,
            keep_running_without_windows,
        }
    }

    /// Whether `trigger` ends the session under this platform's policy.
    pub fn ends_session(&self, trigger: ExitTrigger) -> bool {
        match trigger {
            ExitTrigger::SecondInstance => false,
            ExitTrigger::AllWindowsClosed => !self.keep_running_without_windows,
            _ => true,
        }
    }

    /// Run the hook for `trigger`. May block while the backend is reaped.
    pub fn fire(&self, trigger: ExitTrigger) -> HookOutcome {
        match trigger {
            ExitTrigger::SecondInstance => {
                info!("Second instance launched, focusing existing window");
                HookOutcome::FocusWindow
            }
            _ if !self.ends_session(trigger) => HookOutcome::Continue,
            _ => {
                let outcome = self.session.terminate();
                if outcome != TerminationOutcome::NotTracked {
                    info!("Backend shut down on {} ({outcome:?})", trigger.as_str());
                }
                HookOutcome::Quit
            }
        }
    }

    pub fn session(&self) -> &Arc<BackendSession> {
        &self.session
    }
}
