//! Shared retry-with-backoff policy for external provider calls (spec §5,
//! §7): retried on transient errors up to `max_retries`, doubling the
//! delay each attempt; permanent errors and exhausted retries propagate.

use crate::error::ProviderError;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_retries: 3,
        }
    }
}

pub async fn retry_with_backoff<F, Fut, T>(
    policy: RetryPolicy,
    mut attempt_fn: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    loop {
        match attempt_fn().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                let delay = policy.base_delay * 2u32.pow(attempt);
                tracing::warn!(attempt, ?delay, error = %err, "retrying after transient provider error");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_transient_errors_up_to_limit() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(1),
            max_retries: 2,
        };
        let result: Result<(), ProviderError> = retry_with_backoff(policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::Transient {
                    status: Some(503),
                    message: "unavailable".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn permanent_errors_propagate_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let result: Result<(), ProviderError> = retry_with_backoff(policy, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::Permanent {
                    status: Some(400),
                    message: "bad request".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
