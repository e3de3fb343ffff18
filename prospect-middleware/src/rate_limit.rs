//! Per-source admission control.
//!
//! Each source owns a token bucket (capacity `burst_limit`, refilled at
//! `requests_per_minute / 60` tokens per second) and a log of recent grants.
//! A request is admitted only when the bucket holds a whole token and fewer
//! than `requests_per_minute` grants happened in the trailing minute, so a
//! full burst followed by steady refill can never exceed the per-minute rate.
//! Refill is computed lazily from elapsed time; there is no background timer.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use prospect_core::{CollectorConfig, ProspectError, RateLimitConfig, SourceKey};
use tokio::time::Instant;

use crate::deadline_after;

const WINDOW: Duration = Duration::from_secs(60);
// Absorbs float error so a sleep of exactly the computed wait always yields a token.
const EPSILON: f64 = 1e-9;

/// Proof that a request was admitted by the [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct Permit {
    /// Source the permit was issued for.
    pub source: SourceKey,
    /// When the permit was granted.
    pub granted_at: Instant,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
    grants: VecDeque<Instant>,
    cfg: RateLimitConfig,
}

impl Bucket {
    fn new(cfg: RateLimitConfig, now: Instant) -> Self {
        Self {
            tokens: f64::from(cfg.burst_limit.max(1)),
            last_refill: now,
            grants: VecDeque::new(),
            cfg,
        }
    }

    fn capacity(&self) -> f64 {
        f64::from(self.cfg.burst_limit.max(1))
    }

    fn per_minute(&self) -> usize {
        self.cfg.requests_per_minute.max(1) as usize
    }

    fn refill_rate(&self) -> f64 {
        f64::from(self.cfg.requests_per_minute.max(1)) / 60.0
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_rate()).min(self.capacity());
        self.last_refill = now;
        while let Some(&oldest) = self.grants.front() {
            if now.saturating_duration_since(oldest) >= WINDOW {
                self.grants.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time until a request could be admitted; zero when one can be admitted now.
    fn wait_needed(&self, now: Instant) -> Duration {
        let token_wait = if self.tokens >= 1.0 - EPSILON {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.refill_rate())
        };
        let window_wait = if self.grants.len() >= self.per_minute() {
            self.grants
                .front()
                .map_or(Duration::ZERO, |&oldest| (oldest + WINDOW).saturating_duration_since(now))
        } else {
            Duration::ZERO
        };
        token_wait.max(window_wait)
    }

    fn grant(&mut self, now: Instant) {
        self.tokens = (self.tokens - 1.0).max(0.0);
        self.grants.push_back(now);
    }
}

/// Token-bucket rate limiter keyed by source.
///
/// Buckets are created on first use from the default configuration or a
/// per-source override. Sources never share or affect each other's buckets.
pub struct RateLimiter {
    default: RateLimitConfig,
    overrides: HashMap<String, RateLimitConfig>,
    buckets: Mutex<HashMap<SourceKey, Bucket>>,
}

impl RateLimiter {
    /// Limiter applying `default` to every source.
    #[must_use]
    pub fn new(default: RateLimitConfig) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Limiter configured from the collector's default limit and per-source overrides.
    #[must_use]
    pub fn from_config(cfg: &CollectorConfig) -> Self {
        Self {
            default: cfg.rate_limit,
            overrides: cfg.rate_limit_overrides.clone(),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Override the limit for one source.
    #[must_use]
    pub fn with_override(mut self, source: &str, cfg: RateLimitConfig) -> Self {
        self.overrides.insert(source.to_string(), cfg);
        self
    }

    /// Configuration that applies to `source`.
    #[must_use]
    pub fn config_for(&self, source: SourceKey) -> RateLimitConfig {
        self.overrides
            .get(source.as_str())
            .copied()
            .unwrap_or(self.default)
    }

    /// Admit a request immediately or report how long until one could be admitted.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    fn poll(&self, source: SourceKey) -> Result<Permit, Duration> {
        let now = Instant::now();
        let mut buckets = self.buckets.lock().expect("mutex poisoned");
        let bucket = buckets
            .entry(source)
            .or_insert_with(|| Bucket::new(self.config_for(source), now));
        bucket.refill(now);
        let wait = bucket.wait_needed(now);
        if wait.is_zero() {
            bucket.grant(now);
            Ok(Permit {
                source,
                granted_at: now,
            })
        } else {
            Err(wait)
        }
    }

    /// Take a token without waiting.
    ///
    /// # Errors
    /// Returns `RateLimited` carrying the time until a token is available.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    pub fn try_acquire(&self, source: SourceKey) -> Result<Permit, ProspectError> {
        self.poll(source)
            .map_err(|wait| ProspectError::rate_limited(source.as_str(), duration_ms(wait)))
    }

    /// Take a token, sleeping until one is available.
    ///
    /// Refill is deterministic, so when the next token is due after the
    /// source's `wait_timeout` the call fails at once instead of sleeping out
    /// the timeout first; the outcome is the same, only sooner.
    ///
    /// # Errors
    /// Returns `RateLimited` carrying the time until the next token when it
    /// would arrive after `wait_timeout`.
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "prospect::rate_limit::acquire",
            skip(self),
            fields(source = %source),
        )
    )]
    pub async fn acquire(&self, source: SourceKey) -> Result<Permit, ProspectError> {
        let deadline = deadline_after(Instant::now(), self.config_for(source).wait_timeout);
        loop {
            match self.poll(source) {
                Ok(permit) => return Ok(permit),
                Err(wait) => {
                    let now = Instant::now();
                    if deadline_after(now, wait) > deadline {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(wait_ms = duration_ms(wait), "rate limit wait exceeds timeout");
                        return Err(ProspectError::rate_limited(
                            source.as_str(),
                            duration_ms(wait),
                        ));
                    }
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX).max(1)
}
