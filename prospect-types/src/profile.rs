//! Merged company profile.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One resolved profile field together with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileField {
    /// Winning value.
    pub value: Value,
    /// Name of the source that supplied the winning value.
    pub provenance: String,
    /// Share of reporting sources that agree with the winning value, in `(0, 1]`.
    pub confidence: f64,
    /// When the winning source fetched the value.
    pub fetched_at: DateTime<Utc>,
}

/// Canonical company record produced by the merge step.
///
/// Keys are logical field names (`employee_count`, `industry`,
/// `recent_news`, ...). Fields that no source reported are absent rather
/// than null. Only the merge step builds profiles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyProfile {
    fields: BTreeMap<String, ProfileField>,
}

impl CompanyProfile {
    /// Build a profile from already-resolved fields.
    #[must_use]
    pub const fn from_fields(fields: BTreeMap<String, ProfileField>) -> Self {
        Self { fields }
    }

    /// Resolved field by logical name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&ProfileField> {
        self.fields.get(field)
    }

    /// Resolved value by logical name.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).map(|f| &f.value)
    }

    /// Source that supplied a field.
    #[must_use]
    pub fn provenance(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|f| f.provenance.as_str())
    }

    /// Iterate fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProfileField)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of resolved fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
