//! Prospect-specific data transfer objects, error taxonomy, and configuration primitives.
#![warn(missing_docs)]

mod config;
mod data;
mod error;
mod identifier;
mod priority;
mod profile;
mod reports;
mod source;

pub use config::{
    BackoffConfig, CacheConfig, CircuitBreakerConfig, CollectorConfig, MAX_CONFIG_DURATION,
    RateLimitConfig,
};
pub use data::{NewsArticle, RawSourceData, SkipReason, SourceResult};
pub use error::{ErrorKind, ProspectError};
pub use identifier::{CompanyIdentifier, IdentifierKind};
pub use priority::{FieldPriority, FieldRank};
pub use profile::{CompanyProfile, ProfileField};
pub use reports::{Collection, CollectionReport, OverallStatus, SourceReport};
pub use source::SourceKey;
