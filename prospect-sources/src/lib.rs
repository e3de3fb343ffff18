//! prospect-sources
//!
//! [`SourceClient`](prospect_core::SourceClient) implementations that reach
//! real services over HTTP:
//!
//! - [`WebPageClient`]: scrapes the company homepage.
//! - [`ProfessionalNetworkClient`]: bearer-token JSON company lookup.
//! - [`CompanyDatabaseClient`]: user-key JSON organization entity.
//! - [`NewsAggregatorClient`]: RSS news search.
//!
//! Every client maps HTTP and transport failures onto the shared taxonomy
//! with [`classify_status`] and [`map_transport_error`]. Base URLs are
//! configurable so tests can point clients at a local mock server.
#![warn(missing_docs)]

mod database;
mod http;
mod news;
mod page;
mod professional;

pub use database::CompanyDatabaseClient;
pub use http::{classify_status, map_transport_error, parse_retry_after_ms};
pub use news::{NewsAggregatorClient, parse_feed};
pub use page::{WebPageClient, extract_page};
pub use professional::ProfessionalNetworkClient;
