//! Mock sources for CI-safe tests and demos.
//!
//! - [`MockSource`] answers from static fixtures keyed by the company's
//!   display name, with a few reserved names that simulate failures.
//! - [`DynamicMockSource`] defers every fetch to a test-side controller.

use std::time::Duration;

use async_trait::async_trait;
use prospect_core::{CompanyIdentifier, ProspectError, RawSourceData, SourceClient, SourceKey};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockController, DynamicMockSource, MockBehavior};

/// Companies with fixture data.
pub const FIXTURE_COMPANIES: &[&str] = &["acme", "globex", "partial"];

/// Mock source for CI-safe demos. Provides deterministic data from static fixtures.
///
/// Reserved company names:
/// - `fail`: every source fails transiently.
/// - `timeout`: every source answers after a short delay.
/// - `ratelimited`: every source reports upstream throttling.
/// - `denied`: every source rejects the credentials.
/// - `partial`: the news source fails transiently; other sources answer.
///
/// Any other company without fixtures is reported as not found.
pub struct MockSource {
    key: SourceKey,
}

impl MockSource {
    /// Mock standing in for the source identified by `key`.
    #[must_use]
    pub const fn new(key: SourceKey) -> Self {
        Self { key }
    }

    /// One mock per well-known source.
    #[must_use]
    pub fn all() -> Vec<Self> {
        [
            SourceKey::WEB,
            SourceKey::PROFESSIONAL_NETWORK,
            SourceKey::COMPANY_DATABASE,
            SourceKey::NEWS,
        ]
        .into_iter()
        .map(Self::new)
        .collect()
    }

    /// Delay used for the reserved `timeout` company.
    pub const SLOW_DELAY: Duration = Duration::from_millis(200);

    async fn maybe_fail_or_delay(&self, name: &str) -> Result<(), ProspectError> {
        let source = self.key.as_str();
        match name {
            "fail" => Err(ProspectError::transient(source, "forced failure")),
            "ratelimited" => Err(ProspectError::rate_limited(source, 1_000)),
            "denied" => Err(ProspectError::auth(source, "invalid credentials")),
            "partial" if self.key == SourceKey::NEWS => {
                Err(ProspectError::transient(source, "feed unavailable"))
            }
            "timeout" => {
                // Keep short to avoid slowing tests excessively
                tokio::time::sleep(Self::SLOW_DELAY).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn fixture(&self, name: &str) -> Option<RawSourceData> {
        match self.key {
            SourceKey::WEB => fixtures::page::by_company(name),
            SourceKey::PROFESSIONAL_NETWORK => fixtures::records::professional_network(name),
            SourceKey::COMPANY_DATABASE => fixtures::records::company_database(name),
            SourceKey::NEWS => fixtures::news::by_company(name),
            _ => None,
        }
    }
}

#[async_trait]
impl SourceClient for MockSource {
    fn name(&self) -> &'static str {
        self.key.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Mock"
    }

    async fn fetch(&self, company: &CompanyIdentifier) -> Result<RawSourceData, ProspectError> {
        let name = company.display_name();
        self.maybe_fail_or_delay(name).await?;
        let lookup = if name == "timeout" { "acme" } else { name };
        self.fixture(lookup).ok_or_else(|| {
            ProspectError::not_found(format!("{} record for {company}", self.key))
        })
    }
}
