//! Run summaries and the exportable error log.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StoreError;

/// Most recent error entries kept for export.
pub const ERROR_LOG_CAP: usize = 50;

/// Final tally for one run. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
    /// Wall-clock duration of the run, start to drain.
    pub duration_ms: u64,
    /// Concurrency value when the run drained.
    pub final_concurrency: usize,
    pub finished_at: DateTime<Utc>,
}

/// One logged dispatch error with the queue state at the time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub task_label: String,
    pub concurrency: usize,
    pub queue_len: usize,
}

/// Capped ring of recent dispatch errors, exportable as JSON.
///
/// Failures never interrupt a run; this log is how they stay visible to
/// the user afterwards.
#[derive(Debug)]
pub struct ErrorLog {
    cap: usize,
    entries: Mutex<VecDeque<ErrorEntry>>,
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::with_capacity(ERROR_LOG_CAP)
    }
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            entries: Mutex::new(VecDeque::new()),
        }
    }

    /// Append an entry, evicting the oldest beyond capacity.
    pub async fn record(
        &self,
        message: impl Into<String>,
        task_label: impl Into<String>,
        concurrency: usize,
        queue_len: usize,
    ) {
        let mut entries = self.entries.lock().await;
        if entries.len() == self.cap {
            entries.pop_front();
        }
        entries.push_back(ErrorEntry {
            timestamp: Utc::now(),
            message: message.into(),
            task_label: task_label.into(),
            concurrency,
            queue_len,
        });
    }

    /// Snapshot of the current entries, oldest first.
    pub async fn entries(&self) -> Vec<ErrorEntry> {
        self.entries.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Pretty-printed JSON of all entries, for user export.
    pub async fn export_json(&self) -> Result<String, StoreError> {
        let entries = self.entries().await;
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}
