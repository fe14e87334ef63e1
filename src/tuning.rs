//! Adaptive concurrency controller.
//!
//! Additive-increase/additive-decrease with hysteresis bands: slow or
//! error-prone conditions (rate limiting, server strain) shrink
//! parallelism, fast clean conditions grow it, and the dead band between
//! the thresholds keeps the value from oscillating. Intentionally no
//! multiplicative decrease: batch volumes are small and oscillation hurts
//! more than a slow ramp.

use std::time::Duration;

use crate::metrics::MetricsSnapshot;

/// Above this mean attempt duration the pool shrinks.
pub const SLOW_ATTEMPT: Duration = Duration::from_millis(1500);

/// Below this mean attempt duration the pool may grow.
pub const FAST_ATTEMPT: Duration = Duration::from_millis(600);

/// Above this failure rate the pool shrinks.
pub const HIGH_FAILURE_RATE: f64 = 0.10;

/// Below this failure rate the pool may grow.
pub const LOW_FAILURE_RATE: f64 = 0.05;

/// Proposes a new worker count within fixed bounds.
#[derive(Debug, Clone, Copy)]
pub struct ConcurrencyController {
    min: usize,
    max: usize,
}

impl ConcurrencyController {
    pub fn new(min: usize, max: usize) -> Self {
        let min = min.max(1);
        Self { min, max: max.max(min) }
    }

    /// Propose the next concurrency value. Pure and idempotent for
    /// unchanged metrics; the result always stays within `[min, max]`.
    pub fn adjust(&self, current: usize, metrics: &MetricsSnapshot) -> usize {
        let current = current.clamp(self.min, self.max);

        if metrics.avg_duration > SLOW_ATTEMPT || metrics.failure_rate > HIGH_FAILURE_RATE {
            current.saturating_sub(1).max(self.min)
        } else if metrics.avg_duration < FAST_ATTEMPT && metrics.failure_rate < LOW_FAILURE_RATE {
            (current + 1).min(self.max)
        } else {
            current
        }
    }
}
