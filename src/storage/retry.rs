use std::future::Future;
use std::time::Duration;

use crate::logger;
use crate::utils::errors::StorageError;

impl StorageError {
    /// Whether trying the same call again may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable | StorageError::Request(_))
    }
}

/// Bounded retry of storage calls that fail transiently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StorageError>>,
    {
        let mut tries = 0;
        loop {
            tries += 1;
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && tries < self.attempts => {
                    logger!(
                        WARN,
                        "[STORAGE] `{operation}` failed ({error}). Retrying... [{tries}/{}]",
                        self.attempts
                    );
                    tokio::time::sleep(self.delay).await;
                }
                Err(error) => {
                    logger!(ERROR, "[STORAGE] `{operation}` failed after {tries} attempt(s): {error}");
                    return Err(error);
                }
            }
        }
    }

    /// Like [`RetryPolicy::run`] for calls answering with an acceptance flag;
    /// a refusal becomes [`StorageError::Rejected`].
    pub async fn run_accepted<F, Fut>(&self, operation: &str, call: F) -> Result<(), StorageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, StorageError>>,
    {
        match self.run(operation, call).await? {
            true => Ok(()),
            false => Err(StorageError::Rejected {
                operation: operation.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = policy(3)
            .run("flaky", move || async move {
                match counter.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err(StorageError::Unavailable),
                    _ => Ok(7),
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_last_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = policy(2)
            .run("down", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StorageError::Unavailable)
            })
            .await;

        assert_eq!(result, Err(StorageError::Unavailable));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = policy(3)
            .run_accepted("append_log", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            })
            .await;

        assert_eq!(
            result,
            Err(StorageError::Rejected {
                operation: "append_log".to_string()
            })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
