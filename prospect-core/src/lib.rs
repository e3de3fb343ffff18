//! prospect-core
//!
//! Core traits and pure functions shared across the prospect workspace.
//!
//! - `source`: the `SourceClient` trait every data source implements.
//! - `request`: per-attempt `SourceRequest` and cache `Fingerprint` keys.
//! - `merge`: deterministic merge of per-source results into a `CompanyProfile`.
//! - `status`: overall completeness of a collection run.
//!
//! The data model, error taxonomy and configuration live in `prospect-types`
//! and are re-exported here so downstream crates need only one import path.
#![warn(missing_docs)]

/// Deterministic profile merging.
pub mod merge;
/// Per-attempt requests and cache fingerprints.
pub mod request;
/// The `SourceClient` capability.
pub mod source;
/// Completeness classification of a collection run.
pub mod status;

pub use merge::merge_profile;
pub use request::{Fingerprint, SourceRequest};
pub use source::SourceClient;
pub use status::overall_status;

pub use prospect_types::*;
