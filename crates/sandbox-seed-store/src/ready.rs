//! Readiness probe: bounded retry of a cheap listing call.

use std::time::Duration;

use crate::error::{Result, StoreError};
use crate::VectorStore;

/// Something that can wait. Tests substitute a recorder.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Fixed-delay retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Worst-case time spent sleeping before giving up.
    pub fn budget(&self) -> Duration {
        self.delay * self.max_attempts.saturating_sub(1)
    }
}

/// Poll `list_collections` until it succeeds.
///
/// Returns the 1-based attempt that succeeded. There is no sleep after the
/// final failed attempt.
pub fn wait_until_ready<S, Z>(store: &S, policy: RetryPolicy, sleeper: &Z) -> Result<u32>
where
    S: VectorStore + ?Sized,
    Z: Sleeper + ?Sized,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match store.list_collections() {
            Ok(_) => {
                tracing::debug!(attempt, "vector service ready");
                return Ok(attempt);
            }
            Err(err) => {
                tracing::debug!(attempt, error = %err, "vector service not ready");
                println!("Waiting for the vector service to be ready... (attempt {attempt}/{attempts})");
                if attempt < attempts {
                    sleeper.sleep(policy.delay);
                }
            }
        }
    }
    Err(StoreError::Unavailable { attempts })
}
