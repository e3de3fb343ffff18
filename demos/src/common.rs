use std::sync::Arc;

use prospect::sources::{
    CompanyDatabaseClient, NewsAggregatorClient, ProfessionalNetworkClient, WebPageClient,
};
use prospect::{Collector, ProspectError, SourceClient};
use prospect_mock::MockSource;

/// Set to use the real HTTP sources instead of fixtures.
pub const LIVE_ENV: &str = "PROSPECT_DEMOS_LIVE";
/// Bearer token for the professional-network API.
pub const NETWORK_TOKEN_ENV: &str = "PROSPECT_NETWORK_TOKEN";
/// User key for the company-database API.
pub const DATABASE_KEY_ENV: &str = "PROSPECT_DATABASE_KEY";

/// Return the sources for demos.
///
/// Fixture-backed mocks by default, so demos run offline and in CI. With
/// `PROSPECT_DEMOS_LIVE` set the real clients are used; API-backed ones are
/// only added when their credential variable is present.
#[must_use]
pub fn get_sources() -> Vec<Arc<dyn SourceClient>> {
    if std::env::var_os(LIVE_ENV).is_none() {
        return MockSource::all()
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn SourceClient>)
            .collect();
    }
    let mut out: Vec<Arc<dyn SourceClient>> = vec![
        Arc::new(WebPageClient::new()),
        Arc::new(NewsAggregatorClient::new()),
    ];
    if let Ok(token) = std::env::var(NETWORK_TOKEN_ENV) {
        out.push(Arc::new(ProfessionalNetworkClient::new(token)));
    }
    if let Ok(key) = std::env::var(DATABASE_KEY_ENV) {
        out.push(Arc::new(CompanyDatabaseClient::new(key)));
    }
    out
}

/// Collector over [`get_sources`] with the database and network trusted
/// first, in that order.
///
/// # Errors
/// Returns `InvalidArg` if the collector cannot be built.
pub fn build_collector() -> Result<Collector, ProspectError> {
    let sources = get_sources();
    let ranked: Vec<Arc<dyn SourceClient>> = ["company_database", "professional_network", "web", "news"]
        .iter()
        .filter_map(|name| sources.iter().find(|s| s.name() == *name).cloned())
        .collect();
    sources
        .into_iter()
        .fold(Collector::builder(), prospect::CollectorBuilder::with_source)
        .prefer_sources(&ranked)
        .build()
}
