use std::time::Duration;

use chrono::{DateTime, Utc};
use prospect_core::ProspectError;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

pub(crate) const USER_AGENT: &str = concat!("prospect/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared client configuration for every HTTP source.
pub(crate) fn default_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Map a non-success HTTP status onto the error taxonomy.
///
/// - 401/403: credentials rejected.
/// - 404/410: the source has nothing for `what`.
/// - 429: throttled, with the `Retry-After` hint in milliseconds (0 when absent).
/// - 408 and 5xx: transient.
/// - Any other status: the request was rejected and retrying will not help.
#[must_use]
pub fn classify_status(
    source: &str,
    status: StatusCode,
    retry_after_ms: u64,
    what: &str,
) -> ProspectError {
    match status.as_u16() {
        401 | 403 => ProspectError::auth(source, format!("status {status}")),
        404 | 410 => ProspectError::not_found(what.to_string()),
        429 => ProspectError::rate_limited(source, retry_after_ms),
        408 => ProspectError::transient(source, format!("status {status}")),
        s if (500..600).contains(&s) => {
            ProspectError::transient(source, format!("server error {status}"))
        }
        _ => ProspectError::auth(source, format!("request rejected with status {status}")),
    }
}

/// Map a transport-level failure onto the error taxonomy.
///
/// Connection failures, timeouts and undecodable bodies are transient.
/// Requests that could not even be built (e.g. an invalid URL) are
/// configuration errors.
#[must_use]
pub fn map_transport_error(source: &str, err: &reqwest::Error) -> ProspectError {
    if err.is_builder() {
        return ProspectError::InvalidArg(format!("{source}: {err}"));
    }
    if err.is_timeout() {
        return ProspectError::transient(source, format!("request timed out: {err}"));
    }
    if err.is_decode() {
        return ProspectError::transient(source, format!("undecodable body: {err}"));
    }
    ProspectError::transient(source, err.to_string())
}

/// Parse a `Retry-After` header given in seconds or as an HTTP date.
#[must_use]
pub fn parse_retry_after_ms(headers: &HeaderMap) -> u64 {
    let Some(raw) = headers.get(RETRY_AFTER).and_then(|v| v.to_str().ok()) else {
        return 0;
    };
    let raw = raw.trim();
    if let Ok(secs) = raw.parse::<u64>() {
        return secs.saturating_mul(1_000);
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|at| at.with_timezone(&Utc) - Utc::now())
        .and_then(|d| u64::try_from(d.num_milliseconds()).ok())
        .unwrap_or(0)
}

/// Send `req` and fail on any non-success status.
pub(crate) async fn send(
    source: &str,
    req: RequestBuilder,
    what: &str,
) -> Result<Response, ProspectError> {
    let resp = req
        .send()
        .await
        .map_err(|e| map_transport_error(source, &e))?;
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(source, status = status.as_u16(), "upstream returned error status");
    Err(classify_status(
        source,
        status,
        parse_retry_after_ms(resp.headers()),
        what,
    ))
}

/// Send `req` and decode a JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    source: &str,
    req: RequestBuilder,
    what: &str,
) -> Result<T, ProspectError> {
    send(source, req, what)
        .await?
        .json::<T>()
        .await
        .map_err(|e| map_transport_error(source, &e))
}

/// Send `req` and read the body as text.
pub(crate) async fn get_text(
    source: &str,
    req: RequestBuilder,
    what: &str,
) -> Result<String, ProspectError> {
    send(source, req, what)
        .await?
        .text()
        .await
        .map_err(|e| map_transport_error(source, &e))
}

/// Join `path` onto a configured base URL without doubling slashes.
pub(crate) fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
