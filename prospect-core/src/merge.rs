use std::cmp::{Ordering, Reverse};
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use prospect_types::{CompanyProfile, FieldPriority, FieldRank, ProfileField, SourceResult};

struct Candidate<'a> {
    source: &'a str,
    value: Value,
    fetched_at: DateTime<Utc>,
}

/// Merge per-source outcomes into one canonical profile.
///
/// Only successful results contribute. For every logical field the reporting
/// source with the best rank in `priority` wins; ties go to the most recent
/// `fetched_at`, then to the lexicographically smallest source name. Fields no
/// successful source reports are absent from the output, and null or empty
/// values never participate.
///
/// The result depends only on the set of inputs, never on their order, so
/// results can be merged as they arrive from concurrent fetches.
///
/// Each field's confidence is the share of reporting sources whose value
/// equals the winning one.
pub fn merge_profile<'a, I>(results: I, priority: &FieldPriority) -> CompanyProfile
where
    I: IntoIterator<Item = (&'a str, &'a SourceResult)>,
{
    let mut candidates: BTreeMap<String, Vec<Candidate<'a>>> = BTreeMap::new();
    for (source, result) in results {
        let Some((data, fetched_at)) = result.data() else {
            continue;
        };
        for (field, value) in data.profile_fields() {
            candidates.entry(field).or_default().push(Candidate {
                source,
                value,
                fetched_at,
            });
        }
    }

    let mut fields = BTreeMap::new();
    for (field, mut reports) in candidates {
        reports.sort_by(|a, b| compare(&field, a, b, priority));
        let total = reports.len();
        let mut reports = reports.into_iter();
        let Some(winner) = reports.next() else {
            continue;
        };
        let agreeing = 1 + reports.filter(|c| c.value == winner.value).count();

        #[cfg(feature = "tracing")]
        {
            if agreeing < total {
                tracing::debug!(
                    field = %field,
                    winner = winner.source,
                    reporting = total,
                    agreeing,
                    "conflicting values resolved by priority"
                );
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let confidence = agreeing as f64 / total as f64;
        fields.insert(
            field,
            ProfileField {
                value: winner.value,
                provenance: winner.source.to_string(),
                confidence,
                fetched_at: winner.fetched_at,
            },
        );
    }
    CompanyProfile::from_fields(fields)
}

// Total order: priority rank, newest first, source name, then the value itself
// so duplicate source names cannot make the outcome order-dependent.
fn compare(field: &str, a: &Candidate<'_>, b: &Candidate<'_>, priority: &FieldPriority) -> Ordering {
    sort_key(field, a, priority)
        .cmp(&sort_key(field, b, priority))
        .then_with(|| a.value.to_string().cmp(&b.value.to_string()))
}

fn sort_key<'c>(
    field: &str,
    c: &Candidate<'c>,
    priority: &FieldPriority,
) -> (FieldRank, Reverse<DateTime<Utc>>, &'c str) {
    (priority.rank(field, c.source), Reverse(c.fetched_at), c.source)
}
