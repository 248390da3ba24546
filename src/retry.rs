//! Bounded CAS retry with jittered backoff.
//!
//! Generic over any compare-and-swap style operation: each attempt reports
//! either a committed value or a version conflict, and conflicts are retried
//! after a non-blocking, jittered sleep until the attempt budget is spent.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{CounterError, Result};

/// Attempt budget and backoff shape for one guarded write.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed component of the inter-attempt backoff.
    pub base_backoff: Duration,
    /// Upper bound of the uniform random jitter added on top.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(20),
            max_jitter: Duration::from_millis(40),
        }
    }
}

/// Outcome of a single CAS attempt.
pub enum CasOutcome<T> {
    /// The write landed.
    Committed(T),
    /// The stored version moved underneath us; re-read and try again.
    Conflict,
}

/// Drive `op` until it commits or the attempt budget is spent.
///
/// `op` receives the 1-based attempt number and performs one full
/// read-modify-write round. Errors from `op` abort immediately; only
/// [`CasOutcome::Conflict`] consumes backoff and budget. Exhaustion yields
/// [`CounterError::WriteContention`].
pub async fn run_cas<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<CasOutcome<T>>>,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match op(attempt).await? {
            CasOutcome::Committed(value) => return Ok(value),
            CasOutcome::Conflict => {
                if attempt < attempts {
                    tokio::time::sleep(backoff(policy)).await;
                }
            }
        }
    }
    Err(CounterError::WriteContention { attempts })
}

fn backoff(policy: &RetryPolicy) -> Duration {
    let jitter_ms = policy.max_jitter.as_millis() as u64;
    let jitter = if jitter_ms == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..=jitter_ms)
    };
    policy.base_backoff + Duration::from_millis(jitter)
}
