use std::time::Duration;

use prospect_core::BackoffConfig;
use rand::Rng;

/// Add up to `jitter_percent` percent of random jitter to `base_ms`.
#[must_use]
pub fn jitter_wait(base_ms: u64, jitter_percent: u32) -> u64 {
    let jitter_range = if jitter_percent == 0 {
        1
    } else {
        std::cmp::max(1, (base_ms.saturating_mul(u64::from(jitter_percent))) / 100)
    };
    let mut rng = rand::rng();
    base_ms + rng.random_range(0..jitter_range)
}

/// Un-jittered delay before retry number `retry` (1 for the first retry).
///
/// Grows as `min_backoff_ms * factor^(retry - 1)` and saturates at
/// `max_backoff_ms`.
#[must_use]
pub fn base_delay_ms(cfg: &BackoffConfig, retry: u32) -> u64 {
    let mut delay = cfg.min_backoff_ms;
    for _ in 1..retry {
        delay = delay.saturating_mul(u64::from(cfg.factor.max(1)));
        if delay >= cfg.max_backoff_ms {
            break;
        }
    }
    delay.min(cfg.max_backoff_ms)
}

/// Jittered delay before retry number `retry`.
#[must_use]
pub fn backoff_delay(cfg: &BackoffConfig, retry: u32) -> Duration {
    Duration::from_millis(jitter_wait(
        base_delay_ms(cfg, retry),
        u32::from(cfg.jitter_percent.min(100)),
    ))
}
