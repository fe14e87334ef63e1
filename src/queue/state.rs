//! Run state machine.

use serde::{Deserialize, Serialize};

/// State of the queue across one run.
///
/// Only one run may be `Running` at a time; a start request while a run
/// is active is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run in flight.
    Idle,
    /// Workers are pulling tasks.
    Running,
    /// All tasks accounted for; worker loops are winding down.
    Draining,
}

impl RunState {
    /// Check if this state allows transitioning to another state.
    pub fn can_transition_to(self, target: RunState) -> bool {
        matches!(
            (self, target),
            (RunState::Idle, RunState::Running)
                | (RunState::Running, RunState::Draining)
                | (RunState::Draining, RunState::Idle)
        )
    }

    /// Is a run in flight (running or draining)?
    pub fn is_active(self) -> bool {
        self != RunState::Idle
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
        };
        write!(f, "{s}")
    }
}
