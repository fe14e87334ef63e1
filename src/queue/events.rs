//! Events broadcast during a run.
//!
//! The queue core never renders anything; the presentation layer
//! subscribes via [`RunController::subscribe`] and decides how to show
//! progress and summaries.
//!
//! [`RunController::subscribe`]: crate::runner::RunController::subscribe

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::report::RunSummary;

/// Progress/status events emitted while a batch drains.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    /// A run has started.
    Started { total: usize },
    /// Fired after every attempt (success, retry-enqueue, or terminal
    /// failure). `completed` counts terminal outcomes only.
    Progress { completed: usize, total: usize },
    /// A task exhausted its retries and was counted as failed.
    TaskFailed {
        task_id: Uuid,
        attempts: u32,
        error: String,
    },
    /// The run drained; exactly one per run.
    Completed { summary: RunSummary },
}

impl QueueEvent {
    /// Short event name, e.g. for persistence or log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Progress { .. } => "progress",
            Self::TaskFailed { .. } => "task_failed",
            Self::Completed { .. } => "completed",
        }
    }
}
