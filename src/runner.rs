//! Run controller: drives one batch from start to a drained summary.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{RwLock, broadcast};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::adapter::ActionAdapter;
use crate::config::QueueConfig;
use crate::dedup::DedupCache;
use crate::error::{QueueError, Result};
use crate::history::HistoryStore;
use crate::queue::events::QueueEvent;
use crate::queue::pool::WorkerPool;
use crate::queue::state::RunState;
use crate::report::{ErrorLog, RunSummary};
use crate::task::{DownloadTask, TaskSource};

/// Broadcast channel capacity for queue events.
const EVENT_CAPACITY: usize = 256;

/// Orchestrates batch runs.
///
/// Holds the session-scoped pieces (dedup cache, error log, event
/// channel, history store) and spins up a fresh [`WorkerPool`] per run.
/// A run, once started, always completes with a [`RunSummary`]; the only
/// caller-visible error is the empty-batch precondition.
pub struct RunController {
    config: QueueConfig,
    adapter: Arc<dyn ActionAdapter>,
    dedup: Arc<DedupCache>,
    errors: Arc<ErrorLog>,
    history: Arc<dyn HistoryStore>,
    state: Arc<RwLock<RunState>>,
    events: broadcast::Sender<QueueEvent>,
}

impl RunController {
    pub fn new(
        config: QueueConfig,
        adapter: Arc<dyn ActionAdapter>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        let (events, _rx) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            adapter,
            dedup: Arc::new(DedupCache::new()),
            errors: Arc::new(ErrorLog::new()),
            history,
            state: Arc::new(RwLock::new(RunState::Idle)),
            events,
        }
    }

    /// Subscribe to progress/status events. Each presentation-layer
    /// consumer calls this.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events.subscribe()
    }

    /// The session dedup cache (survives across runs).
    pub fn dedup(&self) -> &Arc<DedupCache> {
        &self.dedup
    }

    /// The exportable error log (survives across runs).
    pub fn error_log(&self) -> &Arc<ErrorLog> {
        &self.errors
    }

    /// Current run state.
    pub async fn state(&self) -> RunState {
        *self.state.read().await
    }

    /// Execute one batch to completion.
    ///
    /// Fails fast with [`QueueError::NoTasksSelected`] on an empty batch.
    /// Returns `Ok(None)` if a run is already in flight (a no-op, not an
    /// error). Otherwise drains the batch and returns the summary, after
    /// appending it to history and broadcasting `Completed`.
    pub async fn start_run(&self, tasks: Vec<DownloadTask>) -> Result<Option<RunSummary>> {
        if tasks.is_empty() {
            return Err(QueueError::NoTasksSelected.into());
        }

        if !self.try_begin().await {
            debug!("run already in progress, ignoring start request");
            return Ok(None);
        }

        let total = tasks.len();
        info!(total, concurrency = self.config.initial_concurrency(), "run started");
        let _ = self.events.send(QueueEvent::Started { total });

        let started = Instant::now();
        let pool = WorkerPool::new(
            self.config.clone(),
            Arc::clone(&self.adapter),
            Arc::clone(&self.dedup),
            Arc::clone(&self.errors),
            Arc::clone(&self.state),
            self.events.clone(),
            tasks,
        );
        let (counts, final_concurrency) = pool.run().await;
        self.finish().await;

        let summary = RunSummary {
            succeeded: counts.succeeded,
            failed: counts.failed,
            total: counts.total,
            duration_ms: started.elapsed().as_millis() as u64,
            final_concurrency,
            finished_at: Utc::now(),
        };

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            total = summary.total,
            duration_ms = summary.duration_ms,
            final_concurrency = summary.final_concurrency,
            "run complete"
        );

        if let Err(err) = self.history.append(summary.clone()).await {
            // History is best-effort; the summary still reaches the caller.
            warn!(error = %err, "failed to append run summary to history");
        }

        let _ = self.events.send(QueueEvent::Completed {
            summary: summary.clone(),
        });

        Ok(Some(summary))
    }

    /// Convenience: pull the batch from a [`TaskSource`] and run it.
    pub async fn run_from(&self, source: &dyn TaskSource) -> Result<Option<RunSummary>> {
        self.start_run(source.tasks()).await
    }

    async fn try_begin(&self) -> bool {
        let mut state = self.state.write().await;
        if !state.can_transition_to(RunState::Running) {
            return false;
        }
        *state = RunState::Running;
        true
    }

    async fn finish(&self) {
        let mut state = self.state.write().await;
        if !state.can_transition_to(RunState::Idle) {
            warn!(state = %*state, "unexpected state at run end");
        }
        *state = RunState::Idle;
    }
}
