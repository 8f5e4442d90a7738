//! Transaction coordinator.
//!
//! Every engine operation runs as one closure inside [`TransactionCoordinator::read_write`].
//! The closure's buffered writes commit together iff it returns `Ok`. When the
//! store signals a serialization abort (from a read or from commit) the whole
//! closure is re-run on a fresh transaction after a capped exponential
//! backoff. Business errors are returned as-is on the first occurrence.

use std::sync::Arc;
use std::time::Duration;

use gamecore_types::{EconomyError, Result, RetryConfig};

use crate::txn::{ReadTxn, Store, WriteTxn};

/// Largest doubling exponent; keeps the shift well inside `u64`.
const MAX_BACKOFF_SHIFT: u32 = 16;

/// Bounded exponential backoff between transaction attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Retry immediately, up to `max_attempts` total attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before attempt `attempt + 1`, where `attempt` counts failures so far (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(MAX_BACKOFF_SHIFT);
        let base_ms = u64::try_from(self.base_backoff.as_millis()).unwrap_or(u64::MAX);
        let delay = Duration::from_millis(base_ms.saturating_mul(1u64 << shift));
        delay.min(self.max_backoff)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_backoff: Duration::from_millis(cfg.base_backoff_ms),
            max_backoff: Duration::from_millis(cfg.max_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

/// Runs units of work against a [`Store`] with retry on serialization aborts.
///
/// Cheap to clone; clones share the store.
pub struct TransactionCoordinator<S: Store> {
    store: Arc<S>,
    policy: RetryPolicy,
}

impl<S: Store> Clone for TransactionCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: Store> TransactionCoordinator<S> {
    #[must_use]
    pub fn new(store: Arc<S>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `work` in a serializable read-write transaction.
    ///
    /// `work` may run more than once; it must not have side effects outside
    /// the transaction handle.
    ///
    /// # Errors
    ///
    /// Whatever `work` returns, unchanged, or [`EconomyError::Conflict`] once
    /// `max_attempts` attempts have all been aborted.
    pub fn read_write<T, F>(&self, tag: &str, mut work: F) -> Result<T>
    where
        F: FnMut(&mut dyn WriteTxn) -> Result<T>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut txn = self.store.begin();
            let outcome = work(txn.as_write()).and_then(|value| txn.commit().map(|()| value));

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(tag, attempt, "transaction committed after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient_abort() => {
                    if attempt >= self.policy.max_attempts {
                        tracing::warn!(
                            tag,
                            attempts = attempt,
                            error = %err,
                            "transaction retries exhausted"
                        );
                        return Err(EconomyError::Conflict {
                            tag: tag.to_string(),
                            attempts: attempt,
                        });
                    }
                    let delay = self.policy.backoff(attempt);
                    tracing::debug!(
                        tag,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transaction aborted, retrying"
                    );
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Run `work` against a read-only snapshot of committed state.
    pub fn read_only<T, F>(&self, tag: &str, work: F) -> Result<T>
    where
        F: FnOnce(&mut dyn ReadTxn) -> Result<T>,
    {
        let mut snapshot = self.store.snapshot();
        let result = work(snapshot.as_mut());
        if let Err(err) = &result {
            tracing::debug!(tag, error = %err, "read-only unit of work failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(30),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(5));
        assert_eq!(policy.backoff(2), Duration::from_millis(10));
        assert_eq!(policy.backoff(3), Duration::from_millis(20));
        assert_eq!(policy.backoff(4), Duration::from_millis(30));
        assert_eq!(policy.backoff(40), Duration::from_millis(30));
    }

    #[test]
    fn immediate_policy_never_sleeps() {
        let policy = RetryPolicy::immediate(3);
        assert_eq!(policy.backoff(1), Duration::ZERO);
        assert_eq!(policy.backoff(7), Duration::ZERO);
    }

    #[test]
    fn policy_from_config() {
        let cfg = RetryConfig {
            max_attempts: 4,
            base_backoff_ms: 2,
            max_backoff_ms: 8,
        };
        let policy = RetryPolicy::from(&cfg);
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.base_backoff, Duration::from_millis(2));
        assert_eq!(policy.max_backoff, Duration::from_millis(8));
    }
}
