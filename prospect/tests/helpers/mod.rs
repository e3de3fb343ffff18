// Shared fixtures for collector tests.
#![allow(dead_code)]

use std::sync::Arc;

use prospect::{
    BackoffConfig, CompanyIdentifier, ProspectError, RawSourceData, SourceClient, SourceResult,
};
use prospect_mock::{DynamicMockController, DynamicMockSource, MockBehavior};
use serde_json::Value;

pub fn acme() -> CompanyIdentifier {
    CompanyIdentifier::parse("acme.io").unwrap()
}

pub fn record(fields: &[(&str, Value)]) -> RawSourceData {
    RawSourceData::Record(
        fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect(),
    )
}

pub fn returns(fields: &[(&str, Value)]) -> MockBehavior {
    MockBehavior::Return(record(fields))
}

pub fn transient(source: &str) -> MockBehavior {
    MockBehavior::Fail(ProspectError::transient(source, "upstream 503"))
}

/// Dynamic mock named `name` answering every fetch with `behavior`.
pub async fn source(
    name: &'static str,
    behavior: MockBehavior,
) -> (Arc<dyn SourceClient>, DynamicMockController) {
    let (s, ctl) = DynamicMockSource::new_with_controller(name);
    ctl.set_default_behavior(behavior).await;
    (s, ctl)
}

/// Short, jitter-free backoff so paused-clock timings are exact.
pub const fn quick_backoff() -> BackoffConfig {
    BackoffConfig {
        min_backoff_ms: 10,
        max_backoff_ms: 100,
        factor: 2,
        jitter_percent: 0,
    }
}

pub fn failure_detail(result: Option<&SourceResult>) -> (prospect::ErrorKind, String) {
    match result {
        Some(SourceResult::Failure { kind, detail }) => (*kind, detail.clone()),
        other => panic!("expected failure, got {other:?}"),
    }
}
