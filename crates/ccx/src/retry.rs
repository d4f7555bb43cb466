//! ⏳ retry.rs: the object store said "not found". The object store is sometimes a liar.
//!
//! Read-after-write on an object store can briefly miss a write that already
//! happened. So existence checks poll: a bounded number of attempts, with
//! exponential backoff between them, capped so nobody waits forever.
//!
//! No jitter. Tests want the same timeline every run, and there is exactly one
//! caller per test, so there is no herd to de-synchronise. 🐑

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

/// 🔧 How hard we try before we admit the file is really not there.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero is treated as one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    6
}

fn default_initial_backoff_ms() -> u64 {
    100
}

fn default_max_backoff_ms() -> u64 {
    2000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// 🎯 What a single poll came back with.
#[derive(Debug)]
pub enum Poll<T, E> {
    /// ✅ Found it. Done.
    Ready(T),
    /// 💤 Not visible yet. Try again after a nap.
    Pending,
    /// 💀 Something worse than "not yet". Do not retry.
    Failed(E),
}

/// 📉 Outcome of the whole polling session.
#[derive(Debug)]
pub enum Polled<T, E> {
    Ready(T),
    Exhausted { attempts: u32 },
    Failed(E),
}

impl RetryPolicy {
    /// 🚀 A policy for tests and impatient humans.
    pub fn new(max_attempts: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// 🙅 Exactly one attempt, no naps.
    pub fn no_retry() -> Self {
        Self::new(1, 0, 0)
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// 📈 Backoff before the retry that follows attempt number `attempt` (0-based).
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        // -- 🧮 doubling with saturating math, then clamp; 2^64 ms is longer than the heat death
        let multiplier = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let base_ms = self.initial_backoff_ms.saturating_mul(multiplier);
        Duration::from_millis(base_ms.min(self.max_backoff_ms))
    }

    /// 🔄 Run `attempt` until it is ready, fails hard, or the budget runs out.
    ///
    /// The closure is re-invoked for each attempt, so it owns building its own request.
    pub async fn poll<T, E, F, Fut>(&self, what: &str, mut attempt: F) -> Polled<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Poll<T, E>>,
    {
        let attempts = self.attempts();
        for attempt_number in 0..attempts {
            match attempt().await {
                Poll::Ready(value) => return Polled::Ready(value),
                Poll::Failed(err) => return Polled::Failed(err),
                Poll::Pending => {
                    if attempt_number + 1 < attempts {
                        let nap = self.backoff_duration(attempt_number);
                        debug!(
                            "💤 {} not visible yet (attempt {}/{}), napping {:?}",
                            what,
                            attempt_number + 1,
                            attempts,
                            nap
                        );
                        tokio::time::sleep(nap).await;
                    }
                }
            }
        }
        Polled::Exhausted { attempts }
    }
}
