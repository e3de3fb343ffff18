use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use prospect_core::{
    BackoffConfig, CollectorConfig, CompanyIdentifier, ErrorKind, ProspectError, RawSourceData,
    SourceKey, SourceRequest, SourceResult,
};

use crate::backoff::backoff_delay;
use crate::circuit::CircuitBreaker;

/// Failure detail of an outcome whose retryable attempts all failed.
pub const RETRIES_EXHAUSTED: &str = "retries_exhausted";

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of operation invocations (at least 1).
    pub max_attempts: u32,
    /// Backoff after transient failures.
    pub backoff: BackoffConfig,
    /// Minimum wait after a rate-limit failure.
    pub rate_limited_wait: Duration,
    /// Per-source rate-limit waits that replace `rate_limited_wait`.
    pub rate_limited_wait_overrides: HashMap<String, Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CollectorConfig::default())
    }
}

impl RetryPolicy {
    /// Policy derived from the collector configuration; rate-limit waits follow
    /// each source's limiter `wait_timeout`.
    #[must_use]
    pub fn from_config(cfg: &CollectorConfig) -> Self {
        Self {
            max_attempts: cfg.retry_attempts.max(1),
            backoff: cfg.backoff,
            rate_limited_wait: cfg.rate_limit.wait_timeout,
            rate_limited_wait_overrides: cfg
                .rate_limit_overrides
                .iter()
                .map(|(k, v)| (k.clone(), v.wait_timeout))
                .collect(),
        }
    }

    fn delay_after(&self, source: SourceKey, err: &ProspectError, attempt: u32) -> Duration {
        match err.kind() {
            ErrorKind::RateLimited => {
                let wait = self
                    .rate_limited_wait_overrides
                    .get(source.as_str())
                    .copied()
                    .unwrap_or(self.rate_limited_wait);
                let hint = Duration::from_millis(err.retry_after_ms().unwrap_or(0));
                wait.max(hint)
            }
            _ => backoff_delay(&self.backoff, attempt),
        }
    }
}

/// Runs a fetch operation under a retry policy and the source's circuit breaker.
///
/// Failures are classified by [`ErrorKind`]:
/// - `Transient` is retried after jittered exponential backoff.
/// - `RateLimited` is retried after the limiter wait or the upstream hint, whichever is longer.
/// - `AuthError` ends immediately as a failure.
/// - `NotFound` ends immediately as an empty success.
///
/// Transient and rate-limit failures count toward opening the circuit; any
/// other answer from the source counts as a success for the breaker. When the
/// circuit is or becomes open the executor stops and reports `CircuitOpen`
/// without invoking the operation again.
pub struct RetryExecutor {
    policy: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
}

impl RetryExecutor {
    /// Create an executor sharing `breaker` with other users.
    #[must_use]
    pub const fn new(policy: RetryPolicy, breaker: Arc<CircuitBreaker>) -> Self {
        Self { policy, breaker }
    }

    /// Policy in use.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Breaker consulted before every attempt.
    #[must_use]
    pub const fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    /// Run `op` until it yields a terminal outcome, invoking it at most
    /// `max_attempts` times. Never fails: every outcome is folded into a
    /// [`SourceResult`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "prospect::retry::execute",
            skip(self, company, op),
            fields(source = %source, company = %company),
        )
    )]
    pub async fn execute<F, Fut>(
        &self,
        source: SourceKey,
        company: &CompanyIdentifier,
        mut op: F,
    ) -> SourceResult
    where
        F: FnMut(SourceRequest) -> Fut,
        Fut: Future<Output = Result<RawSourceData, ProspectError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            if let Err(open) = self.breaker.check(source) {
                return SourceResult::from_error(&open);
            }
            let req = SourceRequest {
                source,
                company: company.clone(),
                attempt,
            };
            let err = match op(req).await {
                Ok(data) => {
                    self.breaker.record_success(source);
                    return SourceResult::success(data);
                }
                Err(err) => err,
            };
            let kind = err.kind();
            if !kind.is_retryable() {
                if matches!(kind, ErrorKind::NotFound | ErrorKind::AuthError) {
                    self.breaker.record_success(source);
                }
                #[cfg(feature = "tracing")]
                tracing::debug!(attempt, error = %err, "terminal failure");
                return SourceResult::from_error(&err);
            }

            self.breaker.record_failure(source);
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt, error = %err, "retryable failure");
            if attempt < max_attempts {
                if let Err(open) = self.breaker.peek(source) {
                    return SourceResult::from_error(&open);
                }
                tokio::time::sleep(self.policy.delay_after(source, &err, attempt)).await;
            }
            #[cfg(feature = "tracing")]
            {
                if attempt == max_attempts {
                    tracing::warn!(attempts = max_attempts, error = %err, "retries exhausted");
                }
            }
        }

        SourceResult::failure(ErrorKind::Transient, RETRIES_EXHAUSTED)
    }
}
