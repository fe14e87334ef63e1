//! Retry policy: per-task attempt counting with linear backoff.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use uuid::Uuid;

/// Outcome of a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-enqueue the task at the tail of the live queue after `delay`.
    Retry { attempts_made: u32, delay: Duration },
    /// The task is terminally failed.
    Exhausted { attempts_made: u32 },
}

/// Per-task attempt counters, scoped to one run.
///
/// `max_attempts` is inclusive of the first attempt, so a task gets up to
/// `max_attempts - 1` retries. The backoff grows linearly
/// (`base_delay × attempts_made`) to spread re-attempts out in time.
#[derive(Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    attempts: Mutex<HashMap<Uuid, u32>>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Record a failed attempt and decide the task's fate.
    pub async fn on_failure(&self, task_id: Uuid) -> RetryDecision {
        let mut attempts = self.attempts.lock().await;
        let made = attempts.entry(task_id).or_insert(0);
        *made += 1;
        let attempts_made = *made;

        if attempts_made < self.max_attempts {
            RetryDecision::Retry {
                attempts_made,
                delay: self.base_delay * attempts_made,
            }
        } else {
            RetryDecision::Exhausted { attempts_made }
        }
    }

    /// Failed attempts recorded so far for a task.
    pub async fn attempts_made(&self, task_id: Uuid) -> u32 {
        self.attempts
            .lock()
            .await
            .get(&task_id)
            .copied()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(400))
    }

    #[tokio::test]
    async fn retries_until_max_attempts() {
        let policy = policy();
        let id = Uuid::new_v4();

        assert_eq!(
            policy.on_failure(id).await,
            RetryDecision::Retry {
                attempts_made: 1,
                delay: Duration::from_millis(400)
            }
        );
        assert_eq!(
            policy.on_failure(id).await,
            RetryDecision::Retry {
                attempts_made: 2,
                delay: Duration::from_millis(800)
            }
        );
        assert_eq!(
            policy.on_failure(id).await,
            RetryDecision::Exhausted { attempts_made: 3 }
        );
    }

    #[tokio::test]
    async fn backoff_strictly_increases() {
        let policy = RetryPolicy::new(5, Duration::from_millis(250));
        let id = Uuid::new_v4();
        let mut last = Duration::ZERO;

        for _ in 0..4 {
            match policy.on_failure(id).await {
                RetryDecision::Retry { delay, .. } => {
                    assert!(delay > last);
                    last = delay;
                }
                RetryDecision::Exhausted { .. } => panic!("exhausted too early"),
            }
        }
    }

    #[tokio::test]
    async fn tasks_tracked_independently() {
        let policy = policy();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        policy.on_failure(a).await;
        policy.on_failure(a).await;
        assert_eq!(policy.attempts_made(a).await, 2);
        assert_eq!(policy.attempts_made(b).await, 0);
    }

    #[tokio::test]
    async fn single_attempt_policy_exhausts_immediately() {
        let policy = RetryPolicy::new(1, Duration::from_millis(400));
        let id = Uuid::new_v4();
        assert_eq!(
            policy.on_failure(id).await,
            RetryDecision::Exhausted { attempts_made: 1 }
        );
    }
}
