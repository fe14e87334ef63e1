//! Queue configuration.

use std::time::Duration;

/// User-settable bounds for the initial worker count.
pub const PARALLEL_DOWNLOADS_MIN: usize = 1;
pub const PARALLEL_DOWNLOADS_MAX: usize = 10;

/// User-settable bounds for the inter-attempt pacing delay.
pub const DOWNLOAD_DELAY_MIN: Duration = Duration::from_millis(100);
pub const DOWNLOAD_DELAY_MAX: Duration = Duration::from_millis(10_000);

/// Configuration for a download run.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Initial worker count, clamped into `[min_concurrency, max_concurrency]`
    /// at run start.
    pub parallel_downloads: usize,
    /// Fixed pacing delay a worker waits between dequeues while the queue is
    /// non-empty. Independent of the adaptive concurrency value, so the
    /// request rate against the external system stays bounded regardless of
    /// worker count.
    pub download_delay: Duration,
    /// Attempts allowed per task, inclusive of the first.
    pub max_attempts: u32,
    /// Floor for the adaptive concurrency value.
    pub min_concurrency: usize,
    /// Ceiling for the adaptive concurrency value.
    pub max_concurrency: usize,
    /// Backoff unit: a retried attempt waits `base_retry_delay × attempts made`.
    pub base_retry_delay: Duration,
    /// Rolling metrics window length (number of recent attempt durations).
    pub metrics_window: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            parallel_downloads: 5,
            download_delay: Duration::from_millis(650),
            max_attempts: 3,
            min_concurrency: 1,
            max_concurrency: 10,
            base_retry_delay: Duration::from_millis(400),
            metrics_window: 20,
        }
    }
}

impl QueueConfig {
    /// Set the initial worker count, clamping out-of-range user values.
    pub fn with_parallel_downloads(mut self, parallel: usize) -> Self {
        self.parallel_downloads = parallel.clamp(PARALLEL_DOWNLOADS_MIN, PARALLEL_DOWNLOADS_MAX);
        self
    }

    /// Set the pacing delay, clamping out-of-range user values.
    pub fn with_download_delay(mut self, delay: Duration) -> Self {
        self.download_delay = delay.clamp(DOWNLOAD_DELAY_MIN, DOWNLOAD_DELAY_MAX);
        self
    }

    /// The concurrency value a run starts from.
    pub fn initial_concurrency(&self) -> usize {
        self.parallel_downloads
            .clamp(self.min_concurrency, self.max_concurrency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_settings_surface() {
        let config = QueueConfig::default();
        assert_eq!(config.parallel_downloads, 5);
        assert_eq!(config.download_delay, Duration::from_millis(650));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.min_concurrency, 1);
        assert_eq!(config.max_concurrency, 10);
        assert_eq!(config.metrics_window, 20);
    }

    #[test]
    fn parallel_downloads_clamped() {
        assert_eq!(
            QueueConfig::default()
                .with_parallel_downloads(0)
                .parallel_downloads,
            1
        );
        assert_eq!(
            QueueConfig::default()
                .with_parallel_downloads(99)
                .parallel_downloads,
            10
        );
        assert_eq!(
            QueueConfig::default()
                .with_parallel_downloads(7)
                .parallel_downloads,
            7
        );
    }

    #[test]
    fn download_delay_clamped() {
        let fast = QueueConfig::default().with_download_delay(Duration::from_millis(5));
        assert_eq!(fast.download_delay, Duration::from_millis(100));

        let slow = QueueConfig::default().with_download_delay(Duration::from_secs(60));
        assert_eq!(slow.download_delay, Duration::from_millis(10_000));
    }

    #[test]
    fn initial_concurrency_respects_bounds() {
        let mut config = QueueConfig::default();
        config.parallel_downloads = 25;
        assert_eq!(config.initial_concurrency(), 10);

        config.parallel_downloads = 0;
        assert_eq!(config.initial_concurrency(), 1);
    }
}
