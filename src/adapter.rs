//! Action adapter seam: the external surface that performs a download.

use async_trait::async_trait;

use crate::error::DispatchError;
use crate::task::DownloadTask;

/// Performs the physical triggering action for one task.
///
/// Implementations must be safe to call multiple times for the same task:
/// the queue retries failed dispatches and only short-circuits via its own
/// dedup cache once a task's fingerprint has succeeded.
#[async_trait]
pub trait ActionAdapter: Send + Sync {
    /// Dispatch one task. `Ok(())` means the action was triggered; any
    /// error is routed through the retry policy, never propagated out of
    /// a worker.
    async fn perform(&self, task: &DownloadTask) -> Result<(), DispatchError>;
}
