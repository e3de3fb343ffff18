use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use prospect_core::{
    Collection, CollectionReport, CompanyIdentifier, ErrorKind, Fingerprint, ProspectError,
    SkipReason, SourceClient, SourceKey, SourceReport, SourceResult, merge_profile,
    overall_status,
};
use tokio::time::Instant;

use crate::core::Collector;

/// Terminal outcome of one source within one run.
struct Outcome {
    name: &'static str,
    result: SourceResult,
    from_cache: bool,
}

impl Collector {
    /// Collect from every registered source and merge the results.
    ///
    /// Never fails: every per-source problem is recorded in the report, and a
    /// collection that yields nothing usable has `overall_status == Failed`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "prospect::collector::collect",
            skip(self),
            fields(company = %company, sources = self.sources.len()),
        )
    )]
    pub async fn collect(&self, company: &CompanyIdentifier) -> Collection {
        self.run(company, self.sources.clone()).await
    }

    /// Collect from a subset of the registered sources.
    ///
    /// Duplicate keys are ignored.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `sources` is empty or names an unregistered source.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "prospect::collector::collect_from",
            skip(self, sources),
            fields(company = %company, sources = sources.len()),
        )
    )]
    pub async fn collect_from(
        &self,
        company: &CompanyIdentifier,
        sources: &[SourceKey],
    ) -> Result<Collection, ProspectError> {
        let selected = self.sources_for(sources)?;
        Ok(self.run(company, selected).await)
    }

    /// Forget every cached outcome for `company`, then collect.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "prospect::collector::refresh",
            skip(self),
            fields(company = %company),
        )
    )]
    pub async fn refresh(&self, company: &CompanyIdentifier) -> Collection {
        let _dropped = self.cache.invalidate_company(company).await;
        #[cfg(feature = "tracing")]
        tracing::debug!(dropped = _dropped, "invalidated cached outcomes");
        self.run(company, self.sources.clone()).await
    }

    /// Parse a company identifier (URL, domain or name) and collect.
    ///
    /// Entry point for command-line front ends; pair it with
    /// [`CollectionReport::exit_code`].
    ///
    /// # Errors
    /// Returns `InvalidArg` when `input` is not a usable identifier.
    pub async fn analyze(&self, input: &str) -> Result<Collection, ProspectError> {
        let company = CompanyIdentifier::parse(input)?;
        Ok(self.collect(&company).await)
    }

    async fn run(
        &self,
        company: &CompanyIdentifier,
        sources: Vec<Arc<dyn SourceClient>>,
    ) -> Collection {
        let started = Instant::now();
        let names: Vec<&'static str> = sources.iter().map(|s| s.name()).collect();
        let parallelism = self
            .cfg
            .max_parallelism
            .unwrap_or(sources.len())
            .max(1);

        let mut done: HashMap<&'static str, Outcome> = HashMap::with_capacity(names.len());
        let mut pending = stream::iter(
            sources
                .into_iter()
                .map(|source| self.collect_one(source, company)),
        )
        .buffer_unordered(parallelism);
        let drain = async {
            while let Some(outcome) = pending.next().await {
                done.insert(outcome.name, outcome);
            }
        };
        if tokio::time::timeout(self.cfg.collection_timeout, drain)
            .await
            .is_err()
        {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                finished = done.len(),
                total = names.len(),
                "collection timed out"
            );
        }
        // Dropping the stream cancels fetches that are still in flight.
        drop(pending);

        let sources: BTreeMap<String, SourceReport> = names
            .into_iter()
            .map(|name| {
                let (result, from_cache) = done.remove(name).map_or_else(
                    || {
                        (
                            SourceResult::failure(ErrorKind::Timeout, "collection timed out"),
                            false,
                        )
                    },
                    |o| (o.result, o.from_cache),
                );
                let report = SourceReport {
                    result,
                    required: self.cfg.is_required(name),
                    from_cache,
                };
                (name.to_string(), report)
            })
            .collect();

        let profile = merge_profile(
            sources.iter().map(|(k, r)| (k.as_str(), &r.result)),
            &self.cfg.priority,
        );
        let overall = overall_status(sources.values().map(|r| (&r.result, r.required)));
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        #[cfg(feature = "tracing")]
        tracing::info!(
            status = ?overall,
            elapsed_ms,
            fields = profile.len(),
            failed = ?sources
                .iter()
                .filter(|(_, r)| !r.result.is_success())
                .map(|(k, _)| k.as_str())
                .collect::<Vec<_>>(),
            "collection finished"
        );

        Collection {
            profile,
            report: CollectionReport {
                company: company.clone(),
                sources,
                overall_status: overall,
                elapsed_ms,
            },
        }
    }

    /// Drive one source through cache, breaker, limiter and retries.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "prospect::collector::source",
            skip(self, source, company),
            fields(source = source.name(), vendor = source.vendor()),
        )
    )]
    async fn collect_one(
        &self,
        source: Arc<dyn SourceClient>,
        company: &CompanyIdentifier,
    ) -> Outcome {
        let name = source.name();
        let key = source.key();
        if self.cfg.is_disabled(name) {
            return Outcome {
                name,
                result: SourceResult::Skipped {
                    reason: SkipReason::Disabled,
                },
                from_cache: false,
            };
        }

        let fingerprint = Fingerprint::new(key, company.clone());
        if self.cfg.cache_enabled
            && let Some(hit) = self.cache.get(&fingerprint).await
        {
            #[cfg(feature = "tracing")]
            tracing::debug!("cache hit");
            return Outcome {
                name,
                result: hit,
                from_cache: true,
            };
        }

        if let Err(ProspectError::CircuitOpen { reset_in_ms, .. }) = self.breaker.peek(key) {
            #[cfg(feature = "tracing")]
            tracing::debug!(reset_in_ms, "circuit open, skipping source");
            return Outcome {
                name,
                result: SourceResult::Skipped {
                    reason: SkipReason::CircuitOpen { reset_in_ms },
                },
                from_cache: false,
            };
        }

        let attempt_timeout = self.cfg.source_timeout;
        let result = self
            .retry
            .execute(key, company, |req| {
                let source = Arc::clone(&source);
                let limiter = Arc::clone(&self.limiter);
                async move {
                    let _permit = limiter.acquire(req.source).await?;
                    tokio::time::timeout(attempt_timeout, source.fetch(&req.company))
                        .await
                        .unwrap_or_else(|_| {
                            Err(ProspectError::transient(
                                req.source.as_str(),
                                format!(
                                    "attempt {} timed out after {}ms",
                                    req.attempt,
                                    attempt_timeout.as_millis()
                                ),
                            ))
                        })
                }
            })
            .await;

        if self.cfg.cache_enabled {
            let _stored = self.cache.put_result(fingerprint, result.clone()).await;
        }
        Outcome {
            name,
            result,
            from_cache: false,
        }
    }
}
