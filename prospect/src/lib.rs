//! Prospect collects what several unreliable sources know about a company.
//!
//! Overview
//! - Fans a collection out to every registered [`SourceClient`] concurrently,
//!   bounded by `max_parallelism` and a collection-wide deadline.
//! - Puts every source behind a shared rate limiter, result cache, retry
//!   executor and circuit breaker from `prospect-middleware`.
//! - Merges per-source results into one [`CompanyProfile`] with field-level
//!   provenance, and explains the run in a [`CollectionReport`].
//!
//! Key behaviors and trade-offs
//! - A source failure never fails a collection; it is recorded and the run
//!   degrades to `Partial` (or `Failed` when nothing usable came back or a
//!   required source failed).
//! - Merge order is configuration-driven: the most trusted source for a field
//!   wins, then the most recent fetch, then the source name. The result does
//!   not depend on arrival order.
//! - Sources with an open circuit are skipped without consuming rate-limit
//!   tokens. Timed-out and circuit-open outcomes are never cached.
//! - The collection deadline drops in-flight fetches; already finished sources
//!   are still merged.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use prospect::{Collector, SourceKey};
//! use prospect_mock::MockSource;
//!
//! let mut builder = Collector::builder();
//! for source in MockSource::all() {
//!     builder = builder.with_source(Arc::new(source));
//! }
//! let collector = builder.required_source(SourceKey::COMPANY_DATABASE.as_str()).build()?;
//!
//! let collection = collector.analyze("https://www.acme.io").await?;
//! println!("{:?}", collection.profile.value("employee_count"));
//! std::process::exit(collection.report.exit_code());
//! ```
#![warn(missing_docs)]

mod collect;
pub(crate) mod core;
mod pipeline;

pub use crate::core::{Collector, CollectorBuilder};
pub use crate::pipeline::{
    Analysis, Analyzer, JsonReport, PipelineOutput, ProfileSummary, ProspectPipeline,
    RenderedReport, ReportGenerator,
};

pub use prospect_middleware::{
    CircuitBreaker, CircuitPhase, CircuitSnapshot, RETRIES_EXHAUSTED, RateLimiter, ResultCache,
    RetryExecutor, RetryPolicy,
};

/// HTTP-backed source clients.
#[cfg(feature = "sources")]
pub use prospect_sources as sources;

// Re-export core types for convenience
pub use prospect_core::{
    BackoffConfig, CacheConfig, CircuitBreakerConfig, Collection, CollectionReport,
    CollectorConfig, CompanyIdentifier, CompanyProfile, ErrorKind, FieldPriority,
    IdentifierKind, NewsArticle, OverallStatus, ProfileField, ProspectError, RateLimitConfig,
    RawSourceData, SkipReason, SourceClient, SourceKey, SourceReport, SourceResult,
};
