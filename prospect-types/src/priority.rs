//! Source priority used to resolve conflicting profile fields.
//!
//! A [`FieldPriority`] holds a default source ordering and optional
//! per-field orderings. When several sources report the same field, the one
//! ranked first for that field wins. Sources missing from a per-field list
//! fall back to their default rank, after every source the per-field list
//! names; sources missing from both rank last.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Sort key for a source on a field; lower is more trusted.
pub type FieldRank = (usize, usize);

/// Ranked list of source names with cached positions for stable sort keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RankedList {
    values: Vec<String>,
    ranks: HashMap<String, usize>,
}

impl RankedList {
    fn new<S: AsRef<str>>(list: &[S]) -> Self {
        let mut values: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for value in list {
            if seen.insert(value.as_ref()) {
                values.push(value.as_ref().to_string());
            }
        }
        let ranks = values
            .iter()
            .enumerate()
            .map(|(idx, v)| (v.clone(), idx))
            .collect();
        Self { values, ranks }
    }

    fn rank(&self, source: &str) -> Option<usize> {
        self.ranks.get(source).copied()
    }
}

/// Configuration-driven trust ordering of sources, globally and per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "FieldPriorityRepr", into = "FieldPriorityRepr")]
pub struct FieldPriority {
    default: RankedList,
    per_field: HashMap<String, RankedList>,
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct FieldPriorityRepr {
    default: Vec<String>,
    fields: BTreeMap<String, Vec<String>>,
}

impl From<FieldPriorityRepr> for FieldPriority {
    fn from(r: FieldPriorityRepr) -> Self {
        Self {
            default: RankedList::new(&r.default),
            per_field: r
                .fields
                .into_iter()
                .map(|(k, v)| (k, RankedList::new(&v)))
                .collect(),
        }
    }
}

impl From<FieldPriority> for FieldPriorityRepr {
    fn from(p: FieldPriority) -> Self {
        Self {
            default: p.default.values,
            fields: p
                .per_field
                .into_iter()
                .map(|(k, v)| (k, v.values))
                .collect(),
        }
    }
}

impl FieldPriority {
    /// Empty priority: every source ranks equally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default ordering, most trusted first. Duplicates are ignored.
    #[must_use]
    pub fn default_order<S: AsRef<str>>(mut self, sources: &[S]) -> Self {
        self.default = RankedList::new(sources);
        self
    }

    /// Set the ordering for one field, most trusted first.
    #[must_use]
    pub fn field_order<S: AsRef<str>>(mut self, field: &str, sources: &[S]) -> Self {
        self.per_field
            .insert(field.to_string(), RankedList::new(sources));
        self
    }

    /// Sort key of `source` for `field`; lower is more trusted.
    #[must_use]
    pub fn rank(&self, field: &str, source: &str) -> FieldRank {
        let field_rank = self
            .per_field
            .get(field)
            .and_then(|l| l.rank(source))
            .unwrap_or(usize::MAX);
        let default_rank = self.default.rank(source).unwrap_or(usize::MAX);
        (field_rank, default_rank)
    }

    /// Every source name mentioned anywhere in this priority.
    #[must_use]
    pub fn mentioned_sources(&self) -> HashSet<&str> {
        self.default
            .values
            .iter()
            .chain(self.per_field.values().flat_map(|l| l.values.iter()))
            .map(String::as_str)
            .collect()
    }
}
