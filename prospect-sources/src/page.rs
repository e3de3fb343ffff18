use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use async_trait::async_trait;
use prospect_core::{CompanyIdentifier, ProspectError, RawSourceData, SourceClient, SourceKey};
use regex::Regex;

use crate::http;

const MAX_TEXT_CHARS: usize = 5_000;
const MAX_PRODUCTS: usize = 20;
const PRODUCT_SECTION_WINDOW: usize = 4_000;

static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));
static RE_META: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("valid regex"));
static RE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\b(name|property|content)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid regex")
});
static RE_PRODUCT_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<(?:section|div|ul)\b[^>]*\b(?:id|class)\s*=\s*["'][^"']*\b(?:products?|services?|solutions?)\b[^"']*["'][^>]*>"#,
    )
    .expect("valid regex")
});
static RE_PRODUCT_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h[2-4][^>]*>(.*?)</h[2-4]>|<li[^>]*>(.*?)</li>").expect("valid regex")
});
static RE_SOCIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)href\s*=\s*["'](https?://(?:www\.)?(linkedin\.com|twitter\.com|x\.com|facebook\.com|github\.com|youtube\.com|instagram\.com)/[^"'\s]*)["']"#,
    )
    .expect("valid regex")
});
static RE_INVISIBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>|<!--.*?-->")
        .expect("valid regex")
});
static RE_TAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)</?[^>]+>").expect("valid regex"));
static RE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Decode entities, strip tags and collapse whitespace.
fn clean_text(s: &str) -> String {
    let without_tags = RE_TAGS.replace_all(s, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    RE_WS.replace_all(&decoded, " ").trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

fn meta_tags(html: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for tag in RE_META.find_iter(html) {
        let mut key = None;
        let mut content = None;
        for cap in RE_ATTR.captures_iter(tag.as_str()) {
            let value = cap.get(2).or_else(|| cap.get(3)).map_or("", |m| m.as_str());
            match cap[1].to_ascii_lowercase().as_str() {
                "content" => content = Some(value.to_string()),
                _ => key = Some(value.to_ascii_lowercase()),
            }
        }
        if let (Some(k), Some(c)) = (key, content.map(|c| clean_text(&c)))
            && !c.is_empty()
        {
            out.entry(k).or_insert(c);
        }
    }
    out
}

fn products(html: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for section in RE_PRODUCT_SECTION.find_iter(html) {
        let rest = &html[section.end()..];
        let end = rest
            .to_ascii_lowercase()
            .find("</section>")
            .unwrap_or(rest.len())
            .min(PRODUCT_SECTION_WINDOW);
        let end = (0..=end).rev().find(|&i| rest.is_char_boundary(i)).unwrap_or(0);
        for cap in RE_PRODUCT_ITEM.captures_iter(&rest[..end]) {
            let raw = cap.get(1).or_else(|| cap.get(2)).map_or("", |m| m.as_str());
            let item = clean_text(raw);
            if !item.is_empty() && item.chars().count() <= 80 && !out.contains(&item) {
                out.push(item);
            }
            if out.len() >= MAX_PRODUCTS {
                return out;
            }
        }
    }
    out
}

fn social_links(html: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for cap in RE_SOCIAL.captures_iter(html) {
        let link = &cap[1];
        let lower = link.to_ascii_lowercase();
        if lower.contains("/share") || lower.contains("/intent/") {
            continue;
        }
        let network = match cap[2].to_ascii_lowercase().as_str() {
            "linkedin.com" => "linkedin",
            "twitter.com" | "x.com" => "twitter",
            "facebook.com" => "facebook",
            "github.com" => "github",
            "youtube.com" => "youtube",
            _ => "instagram",
        };
        out.entry(network.to_string())
            .or_insert_with(|| link.to_string());
    }
    out
}

fn visible_text(html: &str) -> String {
    let stripped = RE_INVISIBLE.replace_all(html, " ");
    let text = clean_text(&stripped);
    match text.char_indices().nth(MAX_TEXT_CHARS) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}

/// Extract page hints from raw HTML fetched from `url`.
#[must_use]
pub fn extract_page(url: &str, html: &str) -> RawSourceData {
    let meta = meta_tags(html);
    let title = RE_TITLE
        .captures(html)
        .map(|c| clean_text(&c[1]))
        .and_then(non_empty);
    let description = meta
        .get("og:description")
        .or_else(|| meta.get("description"))
        .or_else(|| meta.get("twitter:description"))
        .cloned();
    RawSourceData::Page {
        url: url.to_string(),
        title,
        site_name: meta.get("og:site_name").cloned(),
        description,
        products: products(html),
        social_links: social_links(html),
        text: visible_text(html),
    }
}

/// Scrapes the company homepage.
///
/// Only domain identifiers can be scraped; a name-only company is reported as
/// not found. With a base URL configured every company is fetched from that
/// URL instead of `https://{domain}/`.
pub struct WebPageClient {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl Default for WebPageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WebPageClient {
    /// Static source key.
    pub const KEY: SourceKey = SourceKey::WEB;

    /// Client fetching `https://{domain}/`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: http::default_client(),
            base_url: None,
        }
    }

    /// Fetch every page from `base_url` instead of the company's own domain.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Use a preconfigured HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn page_url(&self, domain: &str) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("https://{domain}/"))
    }
}

#[async_trait]
impl SourceClient for WebPageClient {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Web"
    }

    async fn fetch(&self, company: &CompanyIdentifier) -> Result<RawSourceData, ProspectError> {
        let Some(domain) = company.domain() else {
            return Err(ProspectError::not_found(format!(
                "homepage for {company} (no domain)"
            )));
        };
        let url = self.page_url(domain);
        let what = format!("homepage {url}");
        let req = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml");
        let html = http::get_text(self.name(), req, &what).await?;
        Ok(extract_page(&url, &html))
    }
}
