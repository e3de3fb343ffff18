//! Per-source payloads and outcomes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorKind, ProspectError};

/// A single news item returned by a feed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsArticle {
    /// Headline.
    pub title: String,
    /// Link to the article, if the feed provided one.
    pub url: Option<String>,
    /// Publication time, if it could be parsed.
    pub published_at: Option<DateTime<Utc>>,
    /// Publishing outlet, if known.
    pub publisher: Option<String>,
    /// Short plain-text summary.
    pub summary: Option<String>,
}

/// Opaque success payload specific to a source.
///
/// Each variant matches the way a family of sources delivers data. Use
/// [`RawSourceData::profile_fields`] to project any of them onto logical
/// profile fields for merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
#[non_exhaustive]
pub enum RawSourceData {
    /// A retrieved web page with extraction hints.
    Page {
        /// Final URL of the retrieved page.
        url: String,
        /// Contents of the `<title>` element.
        title: Option<String>,
        /// `og:site_name` or equivalent, when present.
        site_name: Option<String>,
        /// Meta or Open Graph description.
        description: Option<String>,
        /// Product or service names found on the page.
        products: Vec<String>,
        /// Social profile links keyed by network name.
        social_links: BTreeMap<String, String>,
        /// Visible page text with markup removed.
        text: String,
    },
    /// A structured record from an API, already keyed by logical field name.
    Record(BTreeMap<String, Value>),
    /// News or social feed items.
    Articles(Vec<NewsArticle>),
    /// Definitive absence: the source answered but knows nothing about the company.
    Empty,
}

impl RawSourceData {
    /// Project the payload onto logical profile fields.
    ///
    /// Null values and empty collections are dropped so they never win a merge.
    #[must_use]
    pub fn profile_fields(&self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        match self {
            Self::Page {
                url,
                title,
                site_name,
                description,
                products,
                social_links,
                ..
            } => {
                if let Some(name) = site_name.as_ref().or(title.as_ref()) {
                    out.insert("name".to_string(), Value::String(name.clone()));
                }
                if let Some(d) = description {
                    out.insert("description".to_string(), Value::String(d.clone()));
                }
                if !products.is_empty() {
                    out.insert(
                        "products".to_string(),
                        Value::Array(products.iter().cloned().map(Value::String).collect()),
                    );
                }
                if !social_links.is_empty() {
                    let links = social_links
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    out.insert("social_links".to_string(), Value::Object(links));
                }
                out.insert("website".to_string(), Value::String(url.clone()));
            }
            Self::Record(fields) => {
                for (k, v) in fields {
                    if !is_blank(v) {
                        out.insert(k.clone(), v.clone());
                    }
                }
            }
            Self::Articles(articles) => {
                if !articles.is_empty()
                    && let Ok(v) = serde_json::to_value(articles)
                {
                    out.insert("recent_news".to_string(), v);
                }
            }
            Self::Empty => {}
        }
        out
    }

    /// True when the payload contributes no profile fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profile_fields().is_empty()
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Why a source was not contacted during a collection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The source's circuit breaker is open.
    CircuitOpen {
        /// Milliseconds until a probe will be admitted.
        reset_in_ms: u64,
    },
    /// The source is disabled by configuration.
    Disabled,
}

/// Outcome of one source for one company in one collection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceResult {
    /// The source answered (possibly with [`RawSourceData::Empty`]).
    Success {
        /// Payload produced by the source.
        data: RawSourceData,
        /// When the payload was fetched.
        fetched_at: DateTime<Utc>,
    },
    /// The source failed terminally.
    Failure {
        /// Classified failure kind.
        kind: ErrorKind,
        /// Human-readable detail.
        detail: String,
    },
    /// The source was not contacted.
    Skipped {
        /// Why it was skipped.
        reason: SkipReason,
    },
}

impl SourceResult {
    /// Success stamped with the current time.
    #[must_use]
    pub fn success(data: RawSourceData) -> Self {
        Self::Success {
            data,
            fetched_at: Utc::now(),
        }
    }

    /// Failure with a kind and detail.
    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }

    /// Convert a terminal error into a result. `NotFound` becomes an empty success.
    #[must_use]
    pub fn from_error(err: &ProspectError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::success(RawSourceData::Empty),
            kind => Self::failure(kind, err.to_string()),
        }
    }

    /// Whether the source answered.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether the source answered with at least one profile field.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Success { data, .. } if !data.is_empty())
    }

    /// Payload and fetch time, for successes.
    #[must_use]
    pub const fn data(&self) -> Option<(&RawSourceData, DateTime<Utc>)> {
        match self {
            Self::Success { data, fetched_at } => Some((data, *fetched_at)),
            _ => None,
        }
    }

    /// Failure kind, for failures.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failure { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
