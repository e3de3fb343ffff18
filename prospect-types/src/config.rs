//! Configuration types shared by the collector and the resilience layer.
//!
//! Every struct is serde-derivable with field-level defaults, so a partial
//! document (e.g. only `{"retry_attempts": 5}`) deserializes into a complete
//! configuration. Loading documents from disk is left to callers.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProspectError;
use crate::priority::FieldPriority;

/// Upper bound accepted by [`CollectorConfig::validate`] for any configured duration.
pub const MAX_CONFIG_DURATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Token-bucket parameters for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Sustained refill rate; tokens arrive at `requests_per_minute / 60` per second.
    pub requests_per_minute: u32,
    /// Bucket capacity: the largest burst granted at once.
    pub burst_limit: u32,
    /// How long `acquire` may wait for a token before failing with `RateLimited`.
    pub wait_timeout: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst_limit: 10,
            wait_timeout: Duration::from_secs(5),
        }
    }
}

/// Exponential backoff configuration for retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry in milliseconds.
    pub min_backoff_ms: u64,
    /// Upper bound for any single delay in milliseconds.
    pub max_backoff_ms: u64,
    /// Exponential factor to increase delay after each failure (>= 1).
    pub factor: u32,
    /// Random jitter percentage [0, 100] added to each delay.
    pub jitter_percent: u8,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min_backoff_ms: 500,
            max_backoff_ms: 30_000,
            factor: 2,
            jitter_percent: 20,
        }
    }
}

/// Expiry and capacity of the result cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Lifetime of successful results. Zero disables caching of successes.
    pub success_ttl: Duration,
    /// Lifetime of failed results; kept short to suppress retry storms.
    pub failure_ttl: Duration,
    /// Maximum number of entries before least-recently-used eviction.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            success_ttl: Duration::from_secs(60 * 60),
            failure_ttl: Duration::from_secs(30),
            max_entries: 1024,
        }
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive transient or rate-limit failures that open the circuit.
    pub failure_threshold: u32,
    /// Initial open period.
    pub cooldown: Duration,
    /// Cap for the open period, which doubles after each failed probe.
    pub max_cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
            max_cooldown: Duration::from_secs(10 * 60),
        }
    }
}

/// Global configuration for the `Collector` orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Maximum number of fetch invocations per source per collection.
    pub retry_attempts: u32,
    /// Whether results are served from and written to the cache.
    pub cache_enabled: bool,
    /// Default rate limit applied to every source.
    pub rate_limit: RateLimitConfig,
    /// Rate limits for specific sources, keyed by source name.
    pub rate_limit_overrides: HashMap<String, RateLimitConfig>,
    /// Retry backoff.
    pub backoff: BackoffConfig,
    /// Cache expiry and capacity.
    pub cache: CacheConfig,
    /// Circuit breaker thresholds.
    pub circuit_breaker: CircuitBreakerConfig,
    /// Source trust ordering used when merging conflicting fields.
    pub priority: FieldPriority,
    /// Upper bound on the wall-clock time of one collection.
    pub collection_timeout: Duration,
    /// Upper bound on a single fetch attempt.
    pub source_timeout: Duration,
    /// Cap on concurrently running source fetches; `None` means one worker per source.
    pub max_parallelism: Option<usize>,
    /// Sources whose failure fails the whole collection.
    pub required_sources: Vec<String>,
    /// Sources that are registered but never contacted.
    pub disabled_sources: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            cache_enabled: true,
            rate_limit: RateLimitConfig::default(),
            rate_limit_overrides: HashMap::new(),
            backoff: BackoffConfig::default(),
            cache: CacheConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            priority: FieldPriority::default(),
            collection_timeout: Duration::from_secs(60),
            source_timeout: Duration::from_secs(30),
            max_parallelism: None,
            required_sources: Vec::new(),
            disabled_sources: Vec::new(),
        }
    }
}

impl CollectorConfig {
    /// Rate limit that applies to `source`.
    #[must_use]
    pub fn rate_limit_for(&self, source: &str) -> &RateLimitConfig {
        self.rate_limit_overrides
            .get(source)
            .unwrap_or(&self.rate_limit)
    }

    /// Whether `source` is marked required.
    #[must_use]
    pub fn is_required(&self, source: &str) -> bool {
        self.required_sources.iter().any(|s| s == source)
    }

    /// Whether `source` is disabled.
    #[must_use]
    pub fn is_disabled(&self, source: &str) -> bool {
        self.disabled_sources.iter().any(|s| s == source)
    }

    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `InvalidArg` when retry attempts, rates, bursts, the backoff
    /// factor, the breaker threshold, parallelism or timeouts are zero, or
    /// when any duration exceeds [`MAX_CONFIG_DURATION`].
    pub fn validate(&self) -> Result<(), ProspectError> {
        if self.retry_attempts == 0 {
            return Err(ProspectError::InvalidArg(
                "retry_attempts must be at least 1".into(),
            ));
        }
        let limits = std::iter::once(("default", &self.rate_limit)).chain(
            self.rate_limit_overrides
                .iter()
                .map(|(k, v)| (k.as_str(), v)),
        );
        for (name, rl) in limits {
            if rl.requests_per_minute == 0 || rl.burst_limit == 0 {
                return Err(ProspectError::InvalidArg(format!(
                    "rate limit for {name} must allow at least one request per minute and a burst of one"
                )));
            }
        }
        if self.backoff.factor == 0 {
            return Err(ProspectError::InvalidArg(
                "backoff factor must be at least 1".into(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ProspectError::InvalidArg(
                "circuit breaker failure_threshold must be at least 1".into(),
            ));
        }
        if self.max_parallelism == Some(0) {
            return Err(ProspectError::InvalidArg(
                "max_parallelism must be at least 1".into(),
            ));
        }
        if self.collection_timeout.is_zero() || self.source_timeout.is_zero() {
            return Err(ProspectError::InvalidArg(
                "collection and source timeouts must be non-zero".into(),
            ));
        }
        let durations = [
            ("cache.success_ttl", self.cache.success_ttl),
            ("cache.failure_ttl", self.cache.failure_ttl),
            ("circuit_breaker.cooldown", self.circuit_breaker.cooldown),
            ("circuit_breaker.max_cooldown", self.circuit_breaker.max_cooldown),
            ("collection_timeout", self.collection_timeout),
            ("source_timeout", self.source_timeout),
        ]
        .into_iter()
        .chain(std::iter::once(("rate_limit.wait_timeout", self.rate_limit.wait_timeout)))
        .chain(
            self.rate_limit_overrides
                .values()
                .map(|rl| ("rate_limit_overrides.wait_timeout", rl.wait_timeout)),
        );
        for (name, d) in durations {
            if d > MAX_CONFIG_DURATION {
                return Err(ProspectError::InvalidArg(format!(
                    "{name} must not exceed {}s",
                    MAX_CONFIG_DURATION.as_secs()
                )));
            }
        }
        Ok(())
    }
}
