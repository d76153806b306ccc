use serde::Serialize;

/// Lifecycle stage of the backend session.
///
/// Transitions only move forward; a terminated session is never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing spawned yet
    NotStarted,
    /// Port allocation and spawn in progress
    Starting,
    /// Backend process is alive and owned by the session
    Running { port: u16, pid: u32 },
    /// Kill issued, waiting for the process to go away
    Terminating,
    /// Session is over
    Terminated,
}

impl SessionState {
    fn rank(&self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Starting => 1,
            Self::Running { .. } => 2,
            Self::Terminating => 3,
            Self::Terminated => 4,
        }
    }

    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Only the forward edges exist, plus `Starting -> Terminated` for a
    /// failed launch.
    pub fn can_transition_to(&self, next: &SessionState) -> bool {
        match (self, next) {
            (Self::Starting, Self::Terminated) => true,
            (Self::Running { .. }, Self::Terminated) => false,
            _ => next.rank() == self.rank() + 1,
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Starting => "starting",
            Self::Running { .. } => "running",
            Self::Terminating => "terminating",
            Self::Terminated => "terminated",
        }
    }
}
