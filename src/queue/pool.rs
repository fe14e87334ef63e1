//! Live worker pool that drains one batch of tasks.
//!
//! Workers share a FIFO queue and pull until every task is terminally
//! succeeded or failed. The concurrency controller rewrites the target
//! bound after every attempt; a supervisor tops the pool up with new
//! worker loops when the bound grows, and surplus loops retire when it
//! shrinks. Retried tasks re-enter at the tail after a backoff that never
//! blocks the worker that scheduled it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock, broadcast};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::adapter::ActionAdapter;
use crate::config::QueueConfig;
use crate::dedup::DedupCache;
use crate::metrics::MetricsWindow;
use crate::queue::events::QueueEvent;
use crate::queue::state::RunState;
use crate::report::ErrorLog;
use crate::retry::{RetryDecision, RetryPolicy};
use crate::task::DownloadTask;
use crate::tuning::ConcurrencyController;

/// How long an idle worker waits before re-checking the queue while
/// retried tasks sit in backoff.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Terminal tallies for one run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub total: usize,
}

impl RunCounts {
    /// Tasks with a terminal outcome so far.
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Every task accounted for?
    pub fn drained(&self) -> bool {
        self.completed() >= self.total
    }
}

/// One run's worker pool. Construct, then [`WorkerPool::run`] to drain.
pub struct WorkerPool {
    shared: Arc<PoolShared>,
}

struct PoolShared {
    config: QueueConfig,
    adapter: Arc<dyn ActionAdapter>,
    dedup: Arc<DedupCache>,
    errors: Arc<ErrorLog>,
    state: Arc<RwLock<RunState>>,
    queue: Mutex<VecDeque<DownloadTask>>,
    counts: Mutex<RunCounts>,
    metrics: Mutex<MetricsWindow>,
    retry: RetryPolicy,
    controller: ConcurrencyController,
    /// Target worker count, rewritten by the controller after every attempt.
    concurrency: AtomicUsize,
    /// Live worker loops.
    active: AtomicUsize,
    /// Woken when a retried task lands back in the queue or the run drains.
    work_ready: Notify,
    /// Woken when the target bound grows.
    scale_up: Notify,
    events: broadcast::Sender<QueueEvent>,
}

impl WorkerPool {
    /// Snapshot a batch into a fresh pool with run-scoped metrics and
    /// retry state. The dedup cache and error log outlive the run.
    pub fn new(
        config: QueueConfig,
        adapter: Arc<dyn ActionAdapter>,
        dedup: Arc<DedupCache>,
        errors: Arc<ErrorLog>,
        state: Arc<RwLock<RunState>>,
        events: broadcast::Sender<QueueEvent>,
        tasks: Vec<DownloadTask>,
    ) -> Self {
        let total = tasks.len();
        let retry = RetryPolicy::new(config.max_attempts, config.base_retry_delay);
        let controller = ConcurrencyController::new(config.min_concurrency, config.max_concurrency);
        let initial = config.initial_concurrency();
        let metrics = MetricsWindow::new(config.metrics_window);

        Self {
            shared: Arc::new(PoolShared {
                config,
                adapter,
                dedup,
                errors,
                state,
                queue: Mutex::new(tasks.into()),
                counts: Mutex::new(RunCounts {
                    succeeded: 0,
                    failed: 0,
                    total,
                }),
                metrics: Mutex::new(metrics),
                retry,
                controller,
                concurrency: AtomicUsize::new(initial),
                active: AtomicUsize::new(0),
                work_ready: Notify::new(),
                scale_up: Notify::new(),
                events,
            }),
        }
    }

    /// Drain the batch. Returns the final tallies and the concurrency
    /// value at drain time.
    pub async fn run(self) -> (RunCounts, usize) {
        let shared = self.shared;
        let total = shared.counts.lock().await.total;
        let starters = shared.concurrency.load(Ordering::Acquire).min(total);
        shared.active.store(starters, Ordering::Release);

        debug!(starters, total, "worker pool starting");

        let mut workers = JoinSet::new();
        for worker_id in 0..starters {
            workers.spawn(worker_loop(Arc::clone(&shared), worker_id));
        }
        let mut next_id = starters;

        loop {
            tokio::select! {
                _ = shared.scale_up.notified() => {
                    while shared.try_grow() {
                        debug!(worker_id = next_id, "spawning worker (bound grew)");
                        workers.spawn(worker_loop(Arc::clone(&shared), next_id));
                        next_id += 1;
                    }
                }
                joined = workers.join_next() => {
                    match joined {
                        Some(Ok(())) => {}
                        Some(Err(err)) => warn!(error = %err, "worker loop panicked"),
                        None => break,
                    }
                }
            }
        }

        let counts = *shared.counts.lock().await;
        let final_concurrency = shared.concurrency.load(Ordering::Acquire);
        debug!(
            succeeded = counts.succeeded,
            failed = counts.failed,
            final_concurrency,
            "worker pool drained"
        );
        (counts, final_concurrency)
    }
}

/// One worker: pull from the head, attempt, pace, repeat.
async fn worker_loop(shared: Arc<PoolShared>, worker_id: usize) {
    loop {
        if shared.try_retire() {
            debug!(worker_id, "worker retired (bound shrank)");
            // try_retire already gave back this loop's active slot.
            return;
        }

        if shared.drained().await {
            break;
        }

        let task = { shared.queue.lock().await.pop_front() };
        let Some(task) = task else {
            // Queue momentarily empty while retries sit in backoff.
            tokio::select! {
                _ = shared.work_ready.notified() => {}
                _ = tokio::time::sleep(IDLE_POLL) => {}
            }
            continue;
        };

        shared.attempt(task).await;

        // Fixed pacing before the next dequeue, independent of the
        // adaptive bound, so the request rate stays bounded.
        if !shared.queue_empty().await && !shared.drained().await {
            tokio::time::sleep(shared.config.download_delay).await;
        }
    }

    shared.active.fetch_sub(1, Ordering::AcqRel);
    debug!(worker_id, "worker finished");
}

impl PoolShared {
    async fn drained(&self) -> bool {
        self.counts.lock().await.drained()
    }

    async fn queue_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }

    /// Claim an active slot if the bound allows another worker.
    fn try_grow(&self) -> bool {
        let target = self.concurrency.load(Ordering::Acquire);
        let mut active = self.active.load(Ordering::Acquire);
        while active < target {
            match self.active.compare_exchange(
                active,
                active + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => active = observed,
            }
        }
        false
    }

    /// Give up this worker's slot if more loops are live than the bound
    /// wants. The compare-and-swap ensures exactly the surplus retires.
    fn try_retire(&self) -> bool {
        let floor = self.config.min_concurrency.max(1);
        let target = self.concurrency.load(Ordering::Acquire).max(floor);
        let mut active = self.active.load(Ordering::Acquire);
        while active > target {
            match self.active.compare_exchange(
                active,
                active - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => active = observed,
            }
        }
        false
    }

    /// One attempt for one task: dedup short-circuit, dispatch, retry
    /// routing, metrics, tuning, progress.
    async fn attempt(self: &Arc<Self>, task: DownloadTask) {
        let cached = self.dedup.has(task.fingerprint()).await;
        let started = Instant::now();
        let outcome = if cached {
            // Already downloaded this session: no-op success, the
            // adapter is never invoked.
            debug!(task_id = %task.id(), fingerprint = %task.fingerprint(), "dedup hit");
            Ok(())
        } else {
            self.adapter.perform(&task).await
        };
        let elapsed = started.elapsed();
        let ok = outcome.is_ok();

        match outcome {
            Ok(()) => {
                self.dedup.mark_done(task.fingerprint()).await;
                self.counts.lock().await.succeeded += 1;
            }
            Err(err) => {
                let queue_len = self.queue.lock().await.len();
                self.errors
                    .record(
                        err.to_string(),
                        task.label(),
                        self.concurrency.load(Ordering::Acquire),
                        queue_len,
                    )
                    .await;

                match self.retry.on_failure(task.id()).await {
                    RetryDecision::Retry {
                        attempts_made,
                        delay,
                    } => {
                        debug!(
                            task_id = %task.id(),
                            attempts_made,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "dispatch failed, re-queueing at tail"
                        );
                        // Backoff happens off-worker so other workers
                        // keep draining meanwhile.
                        let shared = Arc::clone(self);
                        tokio::spawn(async move {
                            tokio::time::sleep(delay).await;
                            shared.queue.lock().await.push_back(task);
                            shared.work_ready.notify_waiters();
                        });
                    }
                    RetryDecision::Exhausted { attempts_made } => {
                        warn!(
                            task_id = %task.id(),
                            attempts_made,
                            error = %err,
                            "retries exhausted, task failed"
                        );
                        self.counts.lock().await.failed += 1;
                        let _ = self.events.send(QueueEvent::TaskFailed {
                            task_id: task.id(),
                            attempts: attempts_made,
                            error: err.to_string(),
                        });
                    }
                }
            }
        }

        // Roll the window, then let the controller move the bound.
        let snapshot = {
            let mut metrics = self.metrics.lock().await;
            metrics.record(elapsed, ok);
            metrics.snapshot()
        };
        let current = self.concurrency.load(Ordering::Acquire);
        let next = self.controller.adjust(current, &snapshot);
        if next != current {
            self.concurrency.store(next, Ordering::Release);
            debug!(
                from = current,
                to = next,
                avg_ms = snapshot.avg_duration.as_millis() as u64,
                failure_rate = snapshot.failure_rate,
                "adjusted concurrency"
            );
            if next > current {
                self.scale_up.notify_one();
            }
        }

        let counts = *self.counts.lock().await;
        let _ = self.events.send(QueueEvent::Progress {
            completed: counts.completed(),
            total: counts.total,
        });

        if counts.drained() {
            self.mark_draining().await;
            // Wake idle workers so they observe the drain and exit.
            self.work_ready.notify_waiters();
        }
    }

    async fn mark_draining(&self) {
        let mut state = self.state.write().await;
        if state.can_transition_to(RunState::Draining) {
            *state = RunState::Draining;
        } else {
            warn!(state = %*state, "unexpected state at drain");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_drain_when_all_accounted() {
        let counts = RunCounts {
            succeeded: 3,
            failed: 2,
            total: 5,
        };
        assert_eq!(counts.completed(), 5);
        assert!(counts.drained());

        let partial = RunCounts {
            succeeded: 3,
            failed: 1,
            total: 5,
        };
        assert!(!partial.drained());
    }
}
