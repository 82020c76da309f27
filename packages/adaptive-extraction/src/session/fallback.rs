//! Retry-with-fallback over an ordered provider chain.
//!
//! Both agent capabilities (propose and validate) share this wrapper: each
//! provider gets a bounded number of attempts with exponential backoff and
//! a hard per-call timeout, then the chain falls to the next provider.
//! Only when every provider is exhausted does the failure surface to the
//! caller, which is what makes a provider outage cost a consensus-round
//! retry instead of the whole session.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::ProviderIdentity;
use crate::types::config::SupervisorConfig;

/// An ordered list of interchangeable providers with shared retry policy.
pub struct ProviderChain<T: ?Sized> {
    providers: Vec<Arc<T>>,

    /// Hard deadline on each individual call, distinct from any
    /// provider-side timeout
    call_timeout: Duration,

    /// Attempts per provider before falling to the next
    attempts_per_provider: u32,

    /// First backoff delay; doubles per attempt
    backoff_base: Duration,

    /// Backoff ceiling
    backoff_cap: Duration,
}

impl<T: ?Sized + ProviderIdentity> ProviderChain<T> {
    /// Create a chain with the retry policy from a supervisor config.
    pub fn from_config(providers: Vec<Arc<T>>, config: &SupervisorConfig) -> Self {
        Self {
            providers,
            call_timeout: config.call_timeout,
            attempts_per_provider: config.provider_retries,
            backoff_base: config.backoff_base,
            backoff_cap: config.backoff_cap,
        }
    }

    /// Create a chain with the default retry policy.
    pub fn new(providers: Vec<Arc<T>>) -> Self {
        Self::from_config(providers, &SupervisorConfig::default())
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the chain has no providers at all.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run an operation against the chain.
    ///
    /// `op` receives each provider in turn and must clone nothing but the
    /// `Arc` it is handed; borrowed context (the page HTML, the candidate)
    /// lives in the caller's frame for the duration of the call.
    ///
    /// Timeouts and transient failures are retried on the same provider
    /// with doubling backoff; auth/quota/invalid-response failures skip
    /// straight to the next provider. Cancellation aborts the current wait
    /// immediately, including mid-backoff.
    pub async fn call<R, F, Fut>(
        &self,
        what: &str,
        cancel: &CancellationToken,
        mut op: F,
    ) -> ProviderResult<R>
    where
        F: FnMut(Arc<T>) -> Fut,
        Fut: Future<Output = ProviderResult<R>>,
    {
        let mut last: Option<ProviderError> = None;

        for provider in &self.providers {
            let name = provider.provider_name().to_string();
            let mut delay = self.backoff_base;

            for attempt in 1..=self.attempts_per_provider {
                if attempt > 1 {
                    tokio::select! {
                        () = tokio::time::sleep(delay) => {}
                        () = cancel.cancelled() => return Err(ProviderError::Cancelled),
                    }
                    delay = (delay * 2).min(self.backoff_cap);
                }

                let outcome = tokio::select! {
                    r = tokio::time::timeout(self.call_timeout, op(Arc::clone(provider))) => r,
                    () = cancel.cancelled() => return Err(ProviderError::Cancelled),
                };

                match outcome {
                    Ok(Ok(value)) => return Ok(value),
                    Ok(Err(ProviderError::Cancelled)) => return Err(ProviderError::Cancelled),
                    Ok(Err(err)) => {
                        warn!(
                            provider = %name,
                            what,
                            attempt,
                            error = %err,
                            "provider call failed"
                        );
                        let retryable = err.is_retryable();
                        last = Some(err);
                        if !retryable {
                            break;
                        }
                    }
                    Err(_) => {
                        warn!(provider = %name, what, attempt, "provider call timed out");
                        last = Some(ProviderError::Timeout {
                            provider: name.clone(),
                        });
                    }
                }
            }
        }

        Err(ProviderError::Exhausted {
            providers: self.providers.len(),
            last: last.map(Box::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Scripted {
        name: String,
        failures_left: AtomicU32,
        calls: AtomicU32,
        error: fn(&str) -> ProviderError,
        hang: bool,
    }

    impl Scripted {
        fn ok(name: &str) -> Arc<Self> {
            Self::failing(name, 0)
        }

        fn failing(name: &str, failures: u32) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                failures_left: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
                error: |n| ProviderError::Unavailable {
                    provider: n.to_string(),
                    source: "scripted failure".into(),
                },
                hang: false,
            })
        }

        fn auth_failing(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                failures_left: AtomicU32::new(u32::MAX),
                calls: AtomicU32::new(0),
                error: |n| ProviderError::Auth {
                    provider: n.to_string(),
                },
                hang: false,
            })
        }

        fn hanging(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                failures_left: AtomicU32::new(0),
                calls: AtomicU32::new(0),
                error: |n| ProviderError::Auth {
                    provider: n.to_string(),
                },
                hang: true,
            })
        }

        async fn invoke(&self) -> ProviderResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                if left != u32::MAX {
                    self.failures_left.fetch_sub(1, Ordering::SeqCst);
                }
                return Err((self.error)(&self.name));
            }
            Ok(self.name.clone())
        }
    }

    impl ProviderIdentity for Scripted {
        fn provider_name(&self) -> &str {
            &self.name
        }
    }

    fn fast_config() -> SupervisorConfig {
        let mut config = SupervisorConfig::default();
        config.call_timeout = Duration::from_millis(50);
        config.provider_retries = 2;
        config.backoff_base = Duration::from_millis(1);
        config.backoff_cap = Duration::from_millis(4);
        config
    }

    #[tokio::test]
    async fn test_falls_through_to_second_provider() {
        let first = Scripted::failing("first", u32::MAX);
        let second = Scripted::ok("second");
        let chain =
            ProviderChain::from_config(vec![first.clone(), second.clone()], &fast_config());

        let result = chain
            .call("test", &CancellationToken::new(), |p| async move {
                p.invoke().await
            })
            .await
            .unwrap();

        assert_eq!(result, "second");
        assert_eq!(first.calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retried_on_same_provider() {
        let flaky = Scripted::failing("flaky", 1);
        let chain = ProviderChain::from_config(vec![flaky.clone()], &fast_config());

        let result = chain
            .call("test", &CancellationToken::new(), |p| async move {
                p.invoke().await
            })
            .await
            .unwrap();

        assert_eq!(result, "flaky");
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_skips_retries() {
        let locked_out = Scripted::auth_failing("locked");
        let backup = Scripted::ok("backup");
        let chain =
            ProviderChain::from_config(vec![locked_out.clone(), backup.clone()], &fast_config());

        let result = chain
            .call("test", &CancellationToken::new(), |p| async move {
                p.invoke().await
            })
            .await
            .unwrap();

        assert_eq!(result, "backup");
        // No second attempt against the auth-failing provider.
        assert_eq!(locked_out.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_provider_failure() {
        let slow = Scripted::hanging("slow");
        let fast = Scripted::ok("fast");
        let chain = ProviderChain::from_config(vec![slow, fast], &fast_config());

        let result = chain
            .call("test", &CancellationToken::new(), |p| async move {
                p.invoke().await
            })
            .await
            .unwrap();

        assert_eq!(result, "fast");
    }

    #[tokio::test]
    async fn test_exhausted_when_all_fail() {
        let a = Scripted::failing("a", u32::MAX);
        let b = Scripted::failing("b", u32::MAX);
        let chain = ProviderChain::from_config(vec![a, b], &fast_config());

        let err = chain
            .call("test", &CancellationToken::new(), |p| async move {
                p.invoke().await
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::Exhausted { providers: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_cancellation_aborts_backoff() {
        let mut config = fast_config();
        config.backoff_base = Duration::from_secs(60);
        let stuck = Scripted::failing("stuck", u32::MAX);
        let chain = ProviderChain::from_config(vec![stuck], &config);

        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = chain
            .call("test", &cancel, |p| async move { p.invoke().await })
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Cancelled));
    }
}
