//! Canonical company identifiers.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ProspectError;

/// What a [`CompanyIdentifier`] was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdentifierKind {
    /// A normalized host name, e.g. `acme.io`.
    Domain,
    /// A normalized free-text company name, e.g. `acme corporation`.
    Name,
}

/// Canonicalized company key used for cache fingerprints and cross-source correlation.
///
/// Immutable once constructed; equal inputs modulo case, scheme, `www.`,
/// paths and whitespace produce equal identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompanyIdentifier {
    kind: IdentifierKind,
    key: String,
}

impl CompanyIdentifier {
    /// Parse and canonicalize a URL, bare domain, or company name.
    ///
    /// # Errors
    /// Returns `InvalidArg` for blank input, URLs with a non-HTTP scheme, or
    /// URLs without a host.
    pub fn parse(input: &str) -> Result<Self, ProspectError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ProspectError::InvalidArg(
                "company identifier must not be empty".into(),
            ));
        }

        if trimmed.contains("://") {
            return Self::domain_from_url(trimmed);
        }
        if looks_like_domain(trimmed) {
            return Self::domain_from_url(&format!("https://{trimmed}"));
        }

        let key = trimmed
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        Ok(Self {
            kind: IdentifierKind::Name,
            key,
        })
    }

    fn domain_from_url(raw: &str) -> Result<Self, ProspectError> {
        let url = Url::parse(raw)
            .map_err(|e| ProspectError::InvalidArg(format!("invalid url '{raw}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProspectError::InvalidArg(format!(
                "unsupported url scheme '{}'",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
            .unwrap_or_default();
        let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
        if host.is_empty() {
            return Err(ProspectError::InvalidArg(format!("url '{raw}' has no host")));
        }
        Ok(Self {
            kind: IdentifierKind::Domain,
            key: host,
        })
    }

    /// The canonical key string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Whether this identifier is a domain or a name.
    #[must_use]
    pub const fn kind(&self) -> IdentifierKind {
        self.kind
    }

    /// The domain, when this identifier was derived from one.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        match self.kind {
            IdentifierKind::Domain => Some(&self.key),
            IdentifierKind::Name => None,
        }
    }

    /// Human-oriented label: the name itself, or the leading domain label.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.kind {
            IdentifierKind::Name => &self.key,
            IdentifierKind::Domain => self.key.split('.').next().unwrap_or(&self.key),
        }
    }
}

fn looks_like_domain(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let authority = s.split(['/', '?', '#']).next().unwrap_or_default();
    let host = match authority.rsplit_once(':') {
        Some((h, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => h,
        _ => authority,
    };
    let labels = host.split('.').filter(|l| !l.is_empty()).count();
    labels >= 2
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

impl fmt::Display for CompanyIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl FromStr for CompanyIdentifier {
    type Err = ProspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CompanyIdentifier {
    type Error = ProspectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CompanyIdentifier> for String {
    fn from(id: CompanyIdentifier) -> Self {
        id.key
    }
}
