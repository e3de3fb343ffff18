use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure taxonomy used for retry decisions and reporting.
///
/// Every [`ProspectError`] maps onto exactly one kind via [`ProspectError::kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Network timeout, 5xx, or an undecodable payload. Retried.
    Transient,
    /// The source (or the local limiter) refused the call for rate reasons. Retried with backoff.
    RateLimited,
    /// Credentials were rejected or the request is not acceptable. Never retried.
    AuthError,
    /// The source definitively has no data for the company. Not a failure.
    NotFound,
    /// The source is suspended by its circuit breaker.
    CircuitOpen,
    /// The collection deadline elapsed before the source completed.
    Timeout,
}

impl ErrorKind {
    /// Whether an error of this kind is worth another attempt.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited)
    }

    /// Whether an error of this kind counts toward opening a circuit.
    #[must_use]
    pub const fn trips_circuit(self) -> bool {
        matches!(self, Self::Transient | Self::RateLimited)
    }

    /// Stable lowercase label used in logs and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::RateLimited => "rate_limited",
            Self::AuthError => "auth_error",
            Self::NotFound => "not_found",
            Self::CircuitOpen => "circuit_open",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for the prospect workspace.
///
/// Source clients fail with `Transient`, `RateLimited`, `Auth` or `NotFound`.
/// The resilience layer adds `CircuitOpen` and `Timeout`; builders and
/// identifier parsing use `InvalidArg`.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProspectError {
    /// A retryable failure talking to a source.
    #[error("{source_name} transient failure: {msg}")]
    Transient {
        /// Source name that failed.
        source_name: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The call was refused for rate reasons, locally or upstream.
    #[error("{source_name} rate limited: retry_after_ms={retry_after_ms}")]
    RateLimited {
        /// Source name that was throttled.
        source_name: String,
        /// Suggested wait before trying again, in milliseconds (0 when unknown).
        retry_after_ms: u64,
    },

    /// Credentials were rejected or the request is not acceptable to the source.
    #[error("{source_name} rejected the request: {msg}")]
    Auth {
        /// Source name that rejected the call.
        source_name: String,
        /// Human-readable error message.
        msg: String,
    },

    /// The source has no record for the requested company.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource, e.g. "organization for acme.io".
        what: String,
    },

    /// The source is suspended by its circuit breaker.
    #[error("{source_name} circuit open: reset_in_ms={reset_in_ms}")]
    CircuitOpen {
        /// Source name whose circuit is open.
        source_name: String,
        /// Milliseconds until a probe will be admitted.
        reset_in_ms: u64,
    },

    /// A deadline elapsed before the source answered.
    #[error("{source_name} timed out")]
    Timeout {
        /// Source name that timed out.
        source_name: String,
    },

    /// Invalid input argument or configuration.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with the returned payload (missing fields, wrong shape).
    #[error("data issue: {0}")]
    Data(String),
}

impl ProspectError {
    /// Helper: build a `Transient` error.
    pub fn transient(source_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Transient {
            source_name: source_name.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `RateLimited` error.
    pub fn rate_limited(source_name: impl Into<String>, retry_after_ms: u64) -> Self {
        Self::RateLimited {
            source_name: source_name.into(),
            retry_after_ms,
        }
    }

    /// Helper: build an `Auth` error.
    pub fn auth(source_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Auth {
            source_name: source_name.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build a `Timeout` error.
    pub fn timeout(source_name: impl Into<String>) -> Self {
        Self::Timeout {
            source_name: source_name.into(),
        }
    }

    /// Classify this error into the retry/reporting taxonomy.
    ///
    /// `Data` problems are treated as transient: an upstream that returned a
    /// garbled body usually recovers. `InvalidArg` cannot be fixed by retrying
    /// and is reported like a rejected request.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transient { .. } | Self::Data(_) => ErrorKind::Transient,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Auth { .. } | Self::InvalidArg(_) => ErrorKind::AuthError,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::CircuitOpen { .. } => ErrorKind::CircuitOpen,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Returns true if another attempt may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Upstream or limiter back-off hint, when one was provided.
    #[must_use]
    pub const fn retry_after_ms(&self) -> Option<u64> {
        match self {
            Self::RateLimited { retry_after_ms, .. } if *retry_after_ms > 0 => {
                Some(*retry_after_ms)
            }
            _ => None,
        }
    }
}
