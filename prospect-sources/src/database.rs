use std::collections::BTreeMap;

use async_trait::async_trait;
use prospect_core::{
    CompanyIdentifier, IdentifierKind, ProspectError, RawSourceData, SourceClient, SourceKey,
};
use serde::Deserialize;
use serde_json::Value;

use crate::http;
use crate::professional::Location;

const DEFAULT_BASE_URL: &str = "https://api.crunchbase.com";

#[derive(Debug, Deserialize)]
struct EntityResponse {
    properties: Option<Properties>,
}

#[derive(Debug, Deserialize)]
struct Properties {
    name: Option<String>,
    short_description: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
    num_employees: Option<u64>,
    /// ISO date, e.g. "2014-03-01"; only the year is kept.
    founded_on: Option<String>,
    funding_total: Option<Money>,
    website_url: Option<String>,
    location: Option<Location>,
}

#[derive(Debug, Deserialize)]
struct Money {
    value_usd: Option<u64>,
}

impl Properties {
    fn into_record(self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        let mut put = |k: &str, v: Option<Value>| {
            if let Some(v) = v {
                out.insert(k.to_string(), v);
            }
        };
        put("name", self.name.map(Value::from));
        put("description", self.short_description.map(Value::from));
        put("industry", self.categories.into_iter().next().map(Value::from));
        put("employee_count", self.num_employees.map(Value::from));
        put(
            "founded_year",
            self.founded_on
                .as_deref()
                .and_then(|d| d.get(..4))
                .and_then(|y| y.parse::<u32>().ok())
                .map(Value::from),
        );
        put(
            "total_funding_usd",
            self.funding_total.and_then(|m| m.value_usd).map(Value::from),
        );
        put("website", self.website_url.map(Value::from));
        put(
            "headquarters",
            self.location.and_then(|l| l.label()).map(Value::from),
        );
        out
    }
}

/// Entity slug used by the database: the domain itself, or a hyphenated name.
fn permalink(company: &CompanyIdentifier) -> String {
    match company.kind() {
        IdentifierKind::Domain => company.as_str().to_string(),
        IdentifierKind::Name => company
            .as_str()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-"),
    }
}

/// Organization lookup against a company-database API.
///
/// Issues `GET {base}/v4/entities/organizations/{permalink}` with the
/// `X-User-Key` header and expects `{"properties": {...}}`.
pub struct CompanyDatabaseClient {
    client: reqwest::Client,
    base_url: String,
    user_key: String,
}

impl CompanyDatabaseClient {
    /// Static source key.
    pub const KEY: SourceKey = SourceKey::COMPANY_DATABASE;

    /// Client authenticating with `user_key`.
    #[must_use]
    pub fn new(user_key: impl Into<String>) -> Self {
        Self {
            client: http::default_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_key: user_key.into(),
        }
    }

    /// Point the client at another API host (e.g. a mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
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
impl SourceClient for CompanyDatabaseClient {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "Crunchbase"
    }

    async fn fetch(&self, company: &CompanyIdentifier) -> Result<RawSourceData, ProspectError> {
        let slug = permalink(company);
        let what = format!("organization {slug}");
        let req = self
            .client
            .get(http::join(
                &self.base_url,
                &format!("/v4/entities/organizations/{slug}"),
            ))
            .header("X-User-Key", &self.user_key);
        let resp: EntityResponse = http::get_json(self.name(), req, &what).await?;
        let record = resp
            .properties
            .map(Properties::into_record)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ProspectError::not_found(what))?;
        Ok(RawSourceData::Record(record))
    }
}
