//! Retry with exponential backoff for transient remote faults.
//!
//! The invoker is the single retry authority: SDK-level retries are
//! disabled in the adapters so attempts are never multiplied.

use crate::config::RetryPolicy;
use costpilot_domain::RemoteFault;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Faults that may go away if the call is repeated.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for RemoteFault {
    fn is_transient(&self) -> bool {
        RemoteFault::is_transient(self)
    }
}

/// Why an invocation failed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvokeError<E> {
    /// The first attempt failed with a fault that is not retried.
    #[error("{fault}")]
    Immediate { fault: E },

    /// Retries were attempted and the last attempt still failed.
    #[error("gave up after {attempts} attempts: {fault}")]
    Exhausted { fault: E, attempts: u32 },
}

impl<E> InvokeError<E> {
    pub fn fault(&self) -> &E {
        match self {
            InvokeError::Immediate { fault } | InvokeError::Exhausted { fault, .. } => fault,
        }
    }

    pub fn attempts(&self) -> u32 {
        match self {
            InvokeError::Immediate { .. } => 1,
            InvokeError::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Runs an operation under a [`RetryPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryingInvoker {
    policy: RetryPolicy,
}

impl RetryingInvoker {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Total attempts allowed; at least one.
    pub fn max_attempts(&self) -> u32 {
        self.policy.max_retries.max(1)
    }

    pub async fn invoke<T, E, F, Fut>(&self, op: F) -> Result<T, InvokeError<E>>
    where
        E: Transient + std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.invoke_observed(op, |_, _, _| {}).await
    }

    /// Like [`invoke`](Self::invoke), reporting each scheduled retry as
    /// `(failed_attempt, fault, delay)` before sleeping.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn invoke_observed<T, E, F, Fut, O>(
        &self,
        mut op: F,
        mut on_retry: O,
    ) -> Result<T, InvokeError<E>>
    where
        E: Transient + std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: FnMut(u32, &E, Duration),
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            let fault = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(fault) => fault,
            };

            if !fault.is_transient() {
                return Err(if attempt == 1 {
                    InvokeError::Immediate { fault }
                } else {
                    InvokeError::Exhausted {
                        fault,
                        attempts: attempt,
                    }
                });
            }

            if attempt >= max_attempts {
                warn!("Max retries reached after {} attempts: {}", attempt, fault);
                return Err(InvokeError::Exhausted {
                    fault,
                    attempts: attempt,
                });
            }

            let delay = self.policy.delay_after(attempt);
            warn!(
                "Throttled. Retrying in {:?} (attempt {}/{}): {}",
                delay, attempt, max_attempts, fault
            );
            on_retry(attempt, &fault, delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(100), Duration::from_secs(10))
    }

    fn throttled() -> RemoteFault {
        RemoteFault::from_code("ThrottlingException", "Rate exceeded")
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, InvokeError<RemoteFault>> = RetryingInvoker::new(policy(3))
            .invoke(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(7) }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_then_success() {
        let calls = AtomicU32::new(0);
        let result = RetryingInvoker::new(policy(3))
            .invoke(|attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(throttled())
                    } else {
                        Ok("listed")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "listed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryingInvoker::new(policy(3))
            .invoke(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(throttled()) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.attempts(), 3);
        assert!(matches!(err, InvokeError::Exhausted { attempts: 3, .. }));
        assert!(err.to_string().starts_with("gave up after 3 attempts"));
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryingInvoker::new(policy(5))
            .invoke(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RemoteFault::from_code("AccessDenied", "no")) }
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, InvokeError::Immediate { .. }));
        assert_eq!(err.fault().code, "AccessDenied");
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_after_retry_reports_attempts() {
        let result: Result<(), _> = RetryingInvoker::new(policy(5))
            .invoke(|attempt| async move {
                if attempt == 1 {
                    Err(throttled())
                } else {
                    Err(RemoteFault::from_code("ValidationError", "bad"))
                }
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            InvokeError::Exhausted { attempts: 2, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn delays_double() {
        let delays = Mutex::new(Vec::new());
        let _: Result<(), _> = RetryingInvoker::new(policy(4))
            .invoke_observed(
                |_| async { Err(throttled()) },
                |attempt, _, delay| delays.lock().unwrap().push((attempt, delay)),
            )
            .await;

        assert_eq!(
            *delays.lock().unwrap(),
            vec![
                (1, Duration::from_millis(200)),
                (2, Duration::from_millis(400)),
                (3, Duration::from_millis(800)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_still_attempts_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryingInvoker::new(policy(0))
            .invoke(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(throttled()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().attempts(), 1);
    }
}
