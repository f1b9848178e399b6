//! Fixed-attempt, fixed-delay retry for single chain calls, built on a
//! constant `backon` backoff.

use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, Retryable};

use crate::ChainError;

pub const DEFAULT_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

/// Call `op` up to `policy.attempts` times, sleeping `policy.delay` between
/// failures. The final failure is wrapped in [`ChainError::RetriesExhausted`].
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    op: F,
) -> Result<T, ChainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    with_retry_observed(policy, label, |_| {}, op).await
}

/// Same as [`with_retry`], calling `on_failure` for every failed attempt
/// that will be retried.
pub async fn with_retry_observed<T, F, Fut, O>(
    policy: &RetryPolicy,
    label: &str,
    mut on_failure: O,
    op: F,
) -> Result<T, ChainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
    O: FnMut(&ChainError),
{
    let attempts = policy.attempts.max(1);
    let backoff = ConstantBuilder::default()
        .with_delay(policy.delay)
        .with_max_times((attempts - 1) as usize);

    op.retry(&backoff)
        .notify(|err: &ChainError, after: Duration| {
            tracing::warn!(label, ?after, error = %err, "chain call failed, retrying");
            on_failure(err);
        })
        .await
        .map_err(|last| ChainError::RetriesExhausted {
            label: label.to_string(),
            attempts,
            last: Box::new(last),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let mut observed = 0;
        let result = with_retry_observed(
            &fast(3),
            "head",
            |_| observed += 1,
            || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ChainError::InvalidResponse("flaky".into()))
                } else {
                    Ok(7u64)
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(observed, 2);
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = with_retry(&fast(3), "logs", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ChainError::BlockNotFound(9))
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(ChainError::RetriesExhausted {
                label,
                attempts,
                last,
            }) => {
                assert_eq!(label, "logs");
                assert_eq!(attempts, 3);
                assert!(matches!(*last, ChainError::BlockNotFound(9)));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_attempts_still_calls_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _: Result<(), _> = with_retry(&fast(0), "block", || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ChainError::NoEndpoints)
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn single_attempt_reports_no_retries() {
        let mut observed = 0;
        let result: Result<(), _> = with_retry_observed(
            &fast(1),
            "logs",
            |_| observed += 1,
            || async { Err(ChainError::Rpc { code: -32005, message: "limit".into() }) },
        )
        .await;
        assert!(matches!(
            result,
            Err(ChainError::RetriesExhausted { attempts: 1, .. })
        ));
        assert_eq!(observed, 0);
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(500));
    }
}
