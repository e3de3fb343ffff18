use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use prospect_core::{
    BackoffConfig, CacheConfig, CircuitBreakerConfig, CollectorConfig, FieldPriority,
    ProspectError, RateLimitConfig, SourceClient, SourceKey,
};
use prospect_middleware::{CircuitBreaker, RateLimiter, ResultCache, RetryExecutor, RetryPolicy};

/// Orchestrator that collects company data from every registered source.
///
/// Owns (or shares, when injected) one rate limiter, one result cache and one
/// circuit breaker. All of them live as long as the collector; nothing is
/// process-global.
pub struct Collector {
    pub(crate) sources: Vec<Arc<dyn SourceClient>>,
    pub(crate) cfg: CollectorConfig,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) cache: Arc<ResultCache>,
    pub(crate) breaker: Arc<CircuitBreaker>,
    pub(crate) retry: RetryExecutor,
}

/// Builder for constructing a [`Collector`] with custom configuration.
pub struct CollectorBuilder {
    sources: Vec<Arc<dyn SourceClient>>,
    cfg: CollectorConfig,
    limiter: Option<Arc<RateLimiter>>,
    cache: Option<Arc<ResultCache>>,
    breaker: Option<Arc<CircuitBreaker>>,
}

impl Default for CollectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn names_of(sources: &[Arc<dyn SourceClient>]) -> Vec<&'static str> {
    sources.iter().map(|s| s.name()).collect()
}

impl CollectorBuilder {
    /// Create a new builder with default configuration.
    ///
    /// Starts with no sources; register at least one via [`with_source`](Self::with_source).
    /// Defaults: 3 attempts per source, cache enabled, 60 requests per minute
    /// with a burst of 10, 30 s per attempt and 60 s per collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: vec![],
            cfg: CollectorConfig::default(),
            limiter: None,
            cache: None,
            breaker: None,
        }
    }

    /// Register a source.
    ///
    /// Registration order only matters for sources the field priority does
    /// not mention; they rank after every listed source regardless.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn SourceClient>) -> Self {
        self.sources.push(source);
        self
    }

    /// Replace the whole configuration.
    ///
    /// Later builder calls modify the replacement.
    #[must_use]
    pub fn config(mut self, cfg: CollectorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Mark a source as required: if it does not succeed the collection fails.
    #[must_use]
    pub fn required_source(mut self, name: &str) -> Self {
        if !self.cfg.is_required(name) {
            self.cfg.required_sources.push(name.to_string());
        }
        self
    }

    /// Keep a source registered but never contact it.
    #[must_use]
    pub fn disable_source(mut self, name: &str) -> Self {
        if !self.cfg.is_disabled(name) {
            self.cfg.disabled_sources.push(name.to_string());
        }
        self
    }

    /// Set the source trust ordering used when merging conflicting fields.
    #[must_use]
    pub fn priority(mut self, priority: FieldPriority) -> Self {
        self.cfg.priority = priority;
        self
    }

    /// Set the default trust ordering using source instances, most trusted first.
    #[must_use]
    pub fn prefer_sources(mut self, sources_desc: &[Arc<dyn SourceClient>]) -> Self {
        let names = names_of(sources_desc);
        self.cfg.priority = std::mem::take(&mut self.cfg.priority).default_order(&names);
        self
    }

    /// Set the trust ordering for a single field using source instances.
    ///
    /// Overrides the default ordering for `field`; unlisted sources rank after
    /// the listed ones, in their default order.
    #[must_use]
    pub fn prefer_for_field(mut self, field: &str, sources_desc: &[Arc<dyn SourceClient>]) -> Self {
        let names = names_of(sources_desc);
        self.cfg.priority = std::mem::take(&mut self.cfg.priority).field_order(field, &names);
        self
    }

    /// Maximum number of fetch invocations per source per collection.
    #[must_use]
    pub const fn retry_attempts(mut self, attempts: u32) -> Self {
        self.cfg.retry_attempts = attempts;
        self
    }

    /// Toggle the result cache.
    #[must_use]
    pub const fn cache_enabled(mut self, yes: bool) -> Self {
        self.cfg.cache_enabled = yes;
        self
    }

    /// Default rate limit applied to every source.
    #[must_use]
    pub const fn rate_limit(mut self, cfg: RateLimitConfig) -> Self {
        self.cfg.rate_limit = cfg;
        self
    }

    /// Rate limit for one source, replacing the default for it.
    #[must_use]
    pub fn rate_limit_for(mut self, name: &str, cfg: RateLimitConfig) -> Self {
        self.cfg.rate_limit_overrides.insert(name.to_string(), cfg);
        self
    }

    /// Retry backoff.
    #[must_use]
    pub const fn backoff(mut self, cfg: BackoffConfig) -> Self {
        self.cfg.backoff = cfg;
        self
    }

    /// Cache expiry and capacity.
    #[must_use]
    pub const fn cache_config(mut self, cfg: CacheConfig) -> Self {
        self.cfg.cache = cfg;
        self
    }

    /// Circuit breaker thresholds.
    #[must_use]
    pub const fn circuit_breaker(mut self, cfg: CircuitBreakerConfig) -> Self {
        self.cfg.circuit_breaker = cfg;
        self
    }

    /// Upper bound on the wall-clock time of one collection.
    ///
    /// Sources still running when it elapses are dropped and reported as
    /// timed out; finished sources are still merged.
    #[must_use]
    pub const fn collection_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.collection_timeout = timeout;
        self
    }

    /// Upper bound on a single fetch attempt. An attempt that exceeds it is
    /// retried like any transient failure.
    #[must_use]
    pub const fn source_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.source_timeout = timeout;
        self
    }

    /// Cap on concurrently running source fetches.
    #[must_use]
    pub const fn max_parallelism(mut self, n: usize) -> Self {
        self.cfg.max_parallelism = Some(n);
        self
    }

    /// Share an existing rate limiter instead of creating one from the configuration.
    #[must_use]
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Share an existing result cache instead of creating one from the configuration.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Share an existing circuit breaker instead of creating one from the configuration.
    #[must_use]
    pub fn with_circuit_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Build the `Collector`.
    ///
    /// Priority entries naming unregistered sources are kept; they never match
    /// a result and so have no effect.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the configuration is invalid, no source is
    /// registered, two sources share a name, a required or disabled source
    /// is not registered, or a source is both required and disabled.
    pub fn build(self) -> Result<Collector, ProspectError> {
        self.cfg.validate()?;
        if self.sources.is_empty() {
            return Err(ProspectError::InvalidArg(
                "no sources registered; add at least one via with_source(...)".to_string(),
            ));
        }

        let mut known: HashSet<&'static str> = HashSet::new();
        for s in &self.sources {
            if !known.insert(s.name()) {
                return Err(ProspectError::InvalidArg(format!(
                    "source '{}' registered more than once",
                    s.name()
                )));
            }
        }
        for name in self
            .cfg
            .required_sources
            .iter()
            .chain(&self.cfg.disabled_sources)
        {
            if !known.contains(name.as_str()) {
                return Err(ProspectError::InvalidArg(format!(
                    "source '{name}' is not registered"
                )));
            }
        }
        if let Some(name) = self
            .cfg
            .required_sources
            .iter()
            .find(|n| self.cfg.is_disabled(n))
        {
            return Err(ProspectError::InvalidArg(format!(
                "source '{name}' cannot be both required and disabled"
            )));
        }

        let limiter = self
            .limiter
            .unwrap_or_else(|| Arc::new(RateLimiter::from_config(&self.cfg)));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ResultCache::new(self.cfg.cache)));
        let breaker = self
            .breaker
            .unwrap_or_else(|| Arc::new(CircuitBreaker::new(self.cfg.circuit_breaker)));
        let retry = RetryExecutor::new(RetryPolicy::from_config(&self.cfg), Arc::clone(&breaker));

        Ok(Collector {
            sources: self.sources,
            cfg: self.cfg,
            limiter,
            cache,
            breaker,
            retry,
        })
    }
}

impl Collector {
    /// Start building a new `Collector`.
    ///
    /// ```rust,ignore
    /// use std::sync::Arc;
    /// use prospect::Collector;
    /// use prospect_sources::{CompanyDatabaseClient, NewsAggregatorClient};
    ///
    /// let db = Arc::new(CompanyDatabaseClient::new("user-key"));
    /// let news = Arc::new(NewsAggregatorClient::new());
    ///
    /// let collector = Collector::builder()
    ///     .with_source(db.clone())
    ///     .with_source(news.clone())
    ///     .prefer_sources(&[db.clone(), news])
    ///     .required_source(db.name())
    ///     .build()?;
    /// ```
    #[must_use]
    pub fn builder() -> CollectorBuilder {
        CollectorBuilder::new()
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &CollectorConfig {
        &self.cfg
    }

    /// Names of the registered sources in registration order.
    #[must_use]
    pub fn source_names(&self) -> Vec<&'static str> {
        names_of(&self.sources)
    }

    /// Rate limiter shared by every collection.
    #[must_use]
    pub const fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Result cache shared by every collection.
    #[must_use]
    pub const fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Circuit breaker shared by every collection.
    #[must_use]
    pub const fn circuit_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub(crate) fn sources_for(
        &self,
        keys: &[SourceKey],
    ) -> Result<Vec<Arc<dyn SourceClient>>, ProspectError> {
        if keys.is_empty() {
            return Err(ProspectError::InvalidArg(
                "at least one source must be selected".to_string(),
            ));
        }
        let mut seen: HashSet<SourceKey> = HashSet::new();
        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            if !seen.insert(*key) {
                continue;
            }
            let source = self
                .sources
                .iter()
                .find(|s| s.key() == *key)
                .ok_or_else(|| {
                    ProspectError::InvalidArg(format!("source '{key}' is not registered"))
                })?;
            out.push(Arc::clone(source));
        }
        Ok(out)
    }
}
