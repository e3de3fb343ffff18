use std::sync::LazyLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prospect_core::{
    CompanyIdentifier, NewsArticle, ProspectError, RawSourceData, SourceClient, SourceKey,
};
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;

use crate::http;

const DEFAULT_BASE_URL: &str = "https://news.google.com";
const DEFAULT_MAX_ARTICLES: usize = 10;
const MAX_SUMMARY_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    source: Option<ItemSource>,
}

#[derive(Debug, Deserialize)]
struct ItemSource {
    #[serde(rename = "$text")]
    name: Option<String>,
}

static RE_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)</?[^>]+>").expect("valid regex"));
static RE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

fn normalize_text(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);
    let stripped = RE_TAGS.replace_all(&decoded, " ");
    let out = RE_WS.replace_all(&stripped, " ").trim().to_string();
    match out.char_indices().nth(MAX_SUMMARY_CHARS) {
        Some((idx, _)) => out[..idx].to_string(),
        None => out,
    }
}

fn parse_pub_date(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(ts.trim())
        .or_else(|_| DateTime::parse_from_rfc3339(ts.trim()))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse an RSS 2.0 document into articles, newest first.
///
/// Items without a title are dropped; undated items sort after dated ones.
///
/// # Errors
/// Returns `Data` when the document is not valid RSS.
pub fn parse_feed(xml: &str, max_articles: usize) -> Result<Vec<NewsArticle>, ProspectError> {
    let rss: Rss = from_str(xml).map_err(|e| ProspectError::Data(format!("invalid rss: {e}")))?;
    let mut out: Vec<NewsArticle> = rss
        .channel
        .item
        .into_iter()
        .filter_map(|it| {
            let title = normalize_text(it.title.as_deref().unwrap_or_default());
            if title.is_empty() {
                return None;
            }
            Some(NewsArticle {
                title,
                url: it.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty()),
                published_at: it.pub_date.as_deref().and_then(parse_pub_date),
                publisher: it
                    .source
                    .and_then(|s| s.name)
                    .map(|s| normalize_text(&s))
                    .filter(|s| !s.is_empty()),
                summary: it
                    .description
                    .map(|d| normalize_text(&d))
                    .filter(|d| !d.is_empty()),
            })
        })
        .collect();
    // Stable: equal dates keep feed order.
    out.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    out.truncate(max_articles);
    Ok(out)
}

/// News search over an RSS feed.
///
/// Issues `GET {base}/rss/search?q="{company}"`. An empty feed means the
/// company is not in the news.
pub struct NewsAggregatorClient {
    client: reqwest::Client,
    base_url: String,
    max_articles: usize,
}

impl Default for NewsAggregatorClient {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsAggregatorClient {
    /// Static source key.
    pub const KEY: SourceKey = SourceKey::NEWS;

    /// Client for the default feed host, keeping at most 10 articles.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: http::default_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_articles: DEFAULT_MAX_ARTICLES,
        }
    }

    /// Point the client at another feed host (e.g. a mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Cap on the number of articles kept per company.
    #[must_use]
    pub const fn with_max_articles(mut self, max_articles: usize) -> Self {
        self.max_articles = max_articles;
        self
    }

    /// Use a preconfigured HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl SourceClient for NewsAggregatorClient {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "RSS"
    }

    async fn fetch(&self, company: &CompanyIdentifier) -> Result<RawSourceData, ProspectError> {
        let query = format!("\"{}\"", company.display_name());
        let what = format!("news for {company}");
        let req = self
            .client
            .get(http::join(&self.base_url, "/rss/search"))
            .query(&[("q", query.as_str()), ("hl", "en-US")]);
        let xml = http::get_text(self.name(), req, &what).await?;
        let articles = parse_feed(&xml, self.max_articles)?;
        if articles.is_empty() {
            return Err(ProspectError::not_found(what));
        }
        Ok(RawSourceData::Articles(articles))
    }
}
