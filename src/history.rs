//! Run history: capped persistent-store seam plus an in-memory backend.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::report::RunSummary;

/// Most recent runs kept; appending beyond this evicts the oldest.
pub const HISTORY_CAP: usize = 10;

/// Backend-agnostic store for run summaries.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a summary, evicting the oldest entry beyond [`HISTORY_CAP`].
    async fn append(&self, summary: RunSummary) -> Result<(), StoreError>;

    /// All stored summaries, most recent first.
    async fn get(&self) -> Result<Vec<RunSummary>, StoreError>;

    /// Drop all stored summaries.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory history, suitable for session-scoped use and tests.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: RwLock<VecDeque<RunSummary>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn append(&self, summary: RunSummary) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        if entries.len() == HISTORY_CAP {
            entries.pop_front();
        }
        entries.push_back(summary);
        Ok(())
    }

    async fn get(&self) -> Result<Vec<RunSummary>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().rev().cloned().collect())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().await.clear();
        Ok(())
    }
}
