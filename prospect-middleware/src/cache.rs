use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use prospect_core::{CacheConfig, CompanyIdentifier, ErrorKind, Fingerprint, SourceResult};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::deadline_after;

struct Entry {
    value: SourceResult,
    expires_at: Instant,
}

/// Fingerprinted store of terminal source outcomes.
///
/// Entries are never returned past their expiry and a write always replaces
/// the previous entry for the same fingerprint. Capacity is bounded; the
/// least recently used entry is evicted first.
pub struct ResultCache {
    inner: Mutex<LruCache<Fingerprint, Entry>>,
    cfg: CacheConfig,
}

impl ResultCache {
    /// Create a cache with the given expiry and capacity settings.
    #[must_use]
    pub fn new(cfg: CacheConfig) -> Self {
        // Avoid zero capacity panics
        let cap = NonZeroUsize::new(cfg.max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            cfg,
        }
    }

    /// Expiry and capacity settings.
    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.cfg
    }

    /// Cached outcome for `key`, if present and not expired.
    pub async fn get(&self, key: &Fingerprint) -> Option<SourceResult> {
        let mut guard = self.inner.lock().await;
        if let Some(entry) = guard.get(key)
            && Instant::now() < entry.expires_at
        {
            return Some(entry.value.clone());
        }
        // If expired, remove it and return None
        guard.pop(key);
        None
    }

    /// Store `value` under `key` for `ttl`.
    ///
    /// A zero `ttl` stores nothing and drops any previous entry for `key`.
    pub async fn put(&self, key: Fingerprint, value: SourceResult, ttl: Duration) {
        let mut guard = self.inner.lock().await;
        if ttl.is_zero() {
            guard.pop(&key);
            return;
        }
        let expires_at = deadline_after(Instant::now(), ttl);
        guard.put(key, Entry { value, expires_at });
    }

    /// Lifetime the cache assigns to `value`, or `None` when it must not be cached.
    ///
    /// Successes live for `success_ttl` and failures for the shorter
    /// `failure_ttl`. Skips, collection timeouts and open circuits describe the
    /// run rather than the source and are never cached.
    #[must_use]
    pub fn ttl_for(&self, value: &SourceResult) -> Option<Duration> {
        match value {
            SourceResult::Success { .. } => Some(self.cfg.success_ttl),
            SourceResult::Failure { kind, .. } => match kind {
                ErrorKind::Timeout | ErrorKind::CircuitOpen => None,
                _ => Some(self.cfg.failure_ttl),
            },
            SourceResult::Skipped { .. } => None,
        }
        .filter(|ttl| !ttl.is_zero())
    }

    /// Store a terminal outcome with the lifetime chosen by [`ResultCache::ttl_for`].
    ///
    /// Returns whether the outcome was stored.
    pub async fn put_result(&self, key: Fingerprint, value: SourceResult) -> bool {
        match self.ttl_for(&value) {
            Some(ttl) => {
                self.put(key, value, ttl).await;
                true
            }
            None => false,
        }
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub async fn invalidate(&self, key: &Fingerprint) -> bool {
        self.inner.lock().await.pop(key).is_some()
    }

    /// Remove every entry for `company`, whatever the source. Returns how many were removed.
    pub async fn invalidate_company(&self, company: &CompanyIdentifier) -> usize {
        let mut guard = self.inner.lock().await;
        let keys: Vec<Fingerprint> = guard
            .iter()
            .filter(|(k, _)| &k.company == company)
            .map(|(k, _)| k.clone())
            .collect();
        for key in &keys {
            guard.pop(key);
        }
        keys.len()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    /// True when nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }
}
