//! Rolling attempt metrics for one run.

use std::collections::VecDeque;
use std::time::Duration;

/// Point-in-time view of the aggregator, read by the concurrency
/// controller. May be one attempt stale under concurrent workers; the
/// controller's hysteresis tolerates that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsSnapshot {
    /// Arithmetic mean of the current window. Zero before any attempt.
    pub avg_duration: Duration,
    /// `failures / (successes + failures)`, zero before any attempt.
    pub failure_rate: f64,
    pub successes: u64,
    pub failures: u64,
}

/// Rolling window of recent attempt durations plus cumulative counters.
///
/// The window holds at most `window` entries, evicting oldest first.
/// Counters are scoped to the run and reset by constructing a fresh
/// aggregator.
#[derive(Debug)]
pub struct MetricsWindow {
    window: usize,
    durations: VecDeque<Duration>,
    successes: u64,
    failures: u64,
}

impl MetricsWindow {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            durations: VecDeque::with_capacity(window.max(1)),
            successes: 0,
            failures: 0,
        }
    }

    /// Record one attempt: its wall-clock duration and whether it succeeded.
    pub fn record(&mut self, duration: Duration, ok: bool) {
        if self.durations.len() == self.window {
            self.durations.pop_front();
        }
        self.durations.push_back(duration);

        if ok {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
    }

    /// Mean of the current window.
    pub fn avg_duration(&self) -> Duration {
        if self.durations.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.durations.iter().sum();
        sum / self.durations.len() as u32
    }

    /// Fraction of attempts this run that failed.
    pub fn failure_rate(&self) -> f64 {
        let total = self.successes + self.failures;
        if total == 0 {
            0.0
        } else {
            self.failures as f64 / total as f64
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            avg_duration: self.avg_duration(),
            failure_rate: self.failure_rate(),
            successes: self.successes,
            failures: self.failures,
        }
    }
}
