//! Report envelopes produced by the collector.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::SourceResult;
use crate::identifier::CompanyIdentifier;
use crate::profile::CompanyProfile;

/// Overall completeness of a collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every configured source answered and at least one contributed data.
    Complete,
    /// Usable data exists but some source failed or was skipped; no required source failed.
    Partial,
    /// No source produced usable data, or a required source failed terminally.
    Failed,
}

/// What happened to one source during a collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Terminal outcome.
    pub result: SourceResult,
    /// Whether the source was marked required.
    pub required: bool,
    /// Whether the outcome was served from the cache.
    pub from_cache: bool,
}

/// Per-source outcomes and completeness for one collection run.
///
/// Explains exactly what succeeded, failed or was skipped and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionReport {
    /// Company the run was for.
    pub company: CompanyIdentifier,
    /// Outcomes keyed by source name.
    pub sources: BTreeMap<String, SourceReport>,
    /// Overall completeness.
    pub overall_status: OverallStatus,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl CollectionReport {
    /// Outcome for a source by name.
    #[must_use]
    pub fn result(&self, source: &str) -> Option<&SourceResult> {
        self.sources.get(source).map(|r| &r.result)
    }

    /// Names of sources whose result was not a success, in name order.
    #[must_use]
    pub fn unsuccessful_sources(&self) -> Vec<&str> {
        self.sources
            .iter()
            .filter(|(_, r)| !r.result.is_success())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// Process exit code for command-line front ends: non-zero exactly when the run failed.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self.overall_status {
            OverallStatus::Failed => 1,
            OverallStatus::Complete | OverallStatus::Partial => 0,
        }
    }
}

/// Result of one collection: the merged profile and the report explaining it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Merged profile; possibly empty.
    pub profile: CompanyProfile,
    /// Per-source outcomes and completeness.
    pub report: CollectionReport,
}
