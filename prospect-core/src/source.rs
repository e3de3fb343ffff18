use async_trait::async_trait;

use prospect_types::{CompanyIdentifier, ProspectError, RawSourceData, SourceKey};

/// A single external data source.
///
/// Implementations only know how to reach their source and translate its
/// answer into [`RawSourceData`]. Rate limiting, caching, retries and circuit
/// breaking are applied around them by the collector, which treats every
/// implementation uniformly.
///
/// `fetch` fails with one of `Transient`, `RateLimited`, `Auth` or
/// `NotFound`; a `NotFound` is a definitive answer and is recorded as an
/// empty success rather than a failure.
#[async_trait]
pub trait SourceClient: Send + Sync {
    /// A stable identifier used in priorities, reports and cache keys (e.g. "web", "news").
    fn name(&self) -> &'static str;

    /// Canonical source key constructed from the static name.
    fn key(&self) -> SourceKey {
        SourceKey::new(self.name())
    }

    /// Human-friendly vendor string.
    fn vendor(&self) -> &'static str {
        "unknown"
    }

    /// Fetch everything this source knows about `company`.
    ///
    /// # Errors
    /// Returns a classified [`ProspectError`] when the source cannot answer.
    async fn fetch(&self, company: &CompanyIdentifier) -> Result<RawSourceData, ProspectError>;
}
