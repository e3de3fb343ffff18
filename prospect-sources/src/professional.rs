use std::collections::BTreeMap;

use async_trait::async_trait;
use prospect_core::{
    CompanyIdentifier, IdentifierKind, ProspectError, RawSourceData, SourceClient, SourceKey,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::http;

const DEFAULT_BASE_URL: &str = "https://api.linkedin.com";

#[derive(Debug, Deserialize)]
struct LookupResponse {
    company: Option<Company>,
}

#[derive(Debug, Deserialize)]
struct Company {
    name: Option<String>,
    industry: Option<String>,
    #[serde(alias = "employee_count")]
    staff_count: Option<u64>,
    headquarters: Option<Location>,
    founded_year: Option<u32>,
    #[serde(default, alias = "specialities")]
    specialties: Vec<String>,
    #[serde(alias = "url")]
    profile_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Location {
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

impl Location {
    /// "City, Region, Country" with missing parts skipped.
    pub(crate) fn label(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

impl Company {
    fn into_record(self) -> BTreeMap<String, Value> {
        let mut out = BTreeMap::new();
        let mut put = |k: &str, v: Option<Value>| {
            if let Some(v) = v {
                out.insert(k.to_string(), v);
            }
        };
        put("name", self.name.map(Value::from));
        put("industry", self.industry.map(Value::from));
        put("employee_count", self.staff_count.map(Value::from));
        put(
            "headquarters",
            self.headquarters.and_then(|l| l.label()).map(Value::from),
        );
        put("founded_year", self.founded_year.map(Value::from));
        if !self.specialties.is_empty() {
            put("specialties", Some(json!(self.specialties)));
        }
        put("profile_url", self.profile_url.map(Value::from));
        out
    }
}

/// Company lookup against a professional-network API.
///
/// Issues `GET {base}/v2/companies/lookup?domain=...` (or `?name=...` for
/// name identifiers) with a bearer token and expects
/// `{"company": {...}}`; a null `company` means the network has no page
/// for the company.
pub struct ProfessionalNetworkClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl ProfessionalNetworkClient {
    /// Static source key.
    pub const KEY: SourceKey = SourceKey::PROFESSIONAL_NETWORK;

    /// Client authenticating with `token`.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: http::default_client(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
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
impl SourceClient for ProfessionalNetworkClient {
    fn name(&self) -> &'static str {
        Self::KEY.as_str()
    }

    fn vendor(&self) -> &'static str {
        "LinkedIn"
    }

    async fn fetch(&self, company: &CompanyIdentifier) -> Result<RawSourceData, ProspectError> {
        let param = match company.kind() {
            IdentifierKind::Domain => "domain",
            IdentifierKind::Name => "name",
        };
        let what = format!("network company page for {company}");
        let req = self
            .client
            .get(http::join(&self.base_url, "/v2/companies/lookup"))
            .bearer_auth(&self.token)
            .query(&[(param, company.as_str())]);
        let resp: LookupResponse = http::get_json(self.name(), req, &what).await?;
        let record = resp
            .company
            .map(Company::into_record)
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ProspectError::not_found(what))?;
        Ok(RawSourceData::Record(record))
    }
}
