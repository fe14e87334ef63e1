//! Error types for downpour.

use std::time::Duration;

/// Top-level error type for the queue.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Run-level precondition failures.
///
/// Nothing in here is fatal to an already-started run: once a run begins
/// it always drains to a summary, even if every task fails.
#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("no tasks selected")]
    NoTasksSelected,
}

/// Per-attempt failure reported by an [`ActionAdapter`].
///
/// These are recovered through the retry policy and only surface to the
/// caller as a `failed` count (and a `TaskFailed` event) once retries are
/// exhausted.
///
/// [`ActionAdapter`]: crate::adapter::ActionAdapter
#[derive(Debug, Clone, thiserror::Error)]
pub enum DispatchError {
    #[error("action target not found: {reason}")]
    TargetMissing { reason: String },

    #[error("dispatch rejected: {reason}")]
    Rejected { reason: String },

    #[error("dispatch timed out after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// History store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to append run summary: {0}")]
    Append(String),

    #[error("failed to read history: {0}")]
    Read(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for the queue.
pub type Result<T> = std::result::Result<T, Error>;
