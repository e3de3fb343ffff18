//! Source metadata types usable across crates.

use core::fmt;

/// Typed key for identifying sources in priority and rate-limit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceKey(pub &'static str);

impl SourceKey {
    /// Key of the company homepage scraper.
    pub const WEB: Self = Self::new("web");
    /// Key of the professional-network API client.
    pub const PROFESSIONAL_NETWORK: Self = Self::new("professional_network");
    /// Key of the company-database API client.
    pub const COMPANY_DATABASE: Self = Self::new("company_database");
    /// Key of the news aggregator client.
    pub const NEWS: Self = Self::new("news");

    /// Construct a new typed source key from a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the inner static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl From<SourceKey> for &'static str {
    fn from(k: SourceKey) -> Self {
        k.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}
