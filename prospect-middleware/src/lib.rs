//! prospect-middleware
//!
//! Shared resilience services placed between the collector and its sources:
//!
//! - [`RateLimiter`]: per-source token buckets with a sliding one-minute cap.
//! - [`ResultCache`]: fingerprinted, expiring, LRU-bounded store of outcomes.
//! - [`CircuitBreaker`]: per-source suspension after consecutive failures.
//! - [`RetryExecutor`]: classification-driven retries with jittered backoff.
//!
//! Every service synchronizes internally and is meant to be shared behind an
//! `Arc`, either created by the collector or injected by the caller. Time is
//! read from `tokio::time`, so paused-clock tests drive expiry and refill.
#![warn(missing_docs)]

/// Jittered exponential backoff helpers.
pub mod backoff;
mod cache;
mod circuit;
mod rate_limit;
mod retry;

pub use crate::cache::ResultCache;
pub use crate::circuit::{CircuitBreaker, CircuitPhase, CircuitSnapshot};
pub use crate::rate_limit::{Permit, RateLimiter};
pub use crate::retry::{RETRIES_EXHAUSTED, RetryExecutor, RetryPolicy};

use std::time::Duration;

use tokio::time::Instant;

// Roughly 30 years; stands in for "never" when a configured duration overflows.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + after`, saturating to a far-future instant instead of overflowing.
pub(crate) fn deadline_after(now: Instant, after: Duration) -> Instant {
    now.checked_add(after)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
