use prospect_types::{OverallStatus, SourceResult};

/// Classify a collection run from its per-source outcomes.
///
/// Each item is a source's terminal result and whether the source is
/// required.
///
/// - `Failed` when a required source did not succeed or no source produced
///   usable data (this includes a run with no sources at all).
/// - `Complete` when every source succeeded and at least one produced usable
///   data. A definitive "not found" is an empty success.
/// - `Partial` otherwise.
pub fn overall_status<'a, I>(outcomes: I) -> OverallStatus
where
    I: IntoIterator<Item = (&'a SourceResult, bool)>,
{
    let mut any_usable = false;
    let mut all_success = true;
    for (result, required) in outcomes {
        if required && !result.is_success() {
            return OverallStatus::Failed;
        }
        any_usable |= result.is_usable();
        all_success &= result.is_success();
    }
    match (any_usable, all_success) {
        (false, _) => OverallStatus::Failed,
        (true, true) => OverallStatus::Complete,
        (true, false) => OverallStatus::Partial,
    }
}
