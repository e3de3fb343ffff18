use std::fmt;

use prospect_types::{CompanyIdentifier, SourceKey};

/// One fetch attempt against one source.
///
/// Created by the retry executor for every attempt and discarded once the
/// attempt has an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRequest {
    /// Source being queried.
    pub source: SourceKey,
    /// Company being looked up.
    pub company: CompanyIdentifier,
    /// 1-based attempt number.
    pub attempt: u32,
}

impl SourceRequest {
    /// First attempt for `source` and `company`.
    #[must_use]
    pub const fn first(source: SourceKey, company: CompanyIdentifier) -> Self {
        Self {
            source,
            company,
            attempt: 1,
        }
    }

    /// Whether this is a retry rather than the initial attempt.
    #[must_use]
    pub const fn is_retry(&self) -> bool {
        self.attempt > 1
    }
}

/// Cache key for the outcome of one source for one company.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint {
    /// Source that produced the outcome.
    pub source: SourceKey,
    /// Company the outcome is about.
    pub company: CompanyIdentifier,
}

impl Fingerprint {
    /// Fingerprint of `(source, company)`.
    #[must_use]
    pub const fn new(source: SourceKey, company: CompanyIdentifier) -> Self {
        Self { source, company }
    }
}

impl From<&SourceRequest> for Fingerprint {
    fn from(req: &SourceRequest) -> Self {
        Self::new(req.source, req.company.clone())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.company)
    }
}
