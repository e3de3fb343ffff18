use std::sync::Arc;
use std::time::Duration;

use prospect::{
    CircuitBreaker, CircuitBreakerConfig, Collection, Collector, ErrorKind, OverallStatus,
    RETRIES_EXHAUSTED, RawSourceData, SkipReason, SourceClient, SourceKey, SourceResult,
};
use prospect_mock::MockBehavior;
use serde_json::json;

use crate::helpers::{acme, failure_detail, quick_backoff, returns, source, transient};

#[tokio::test(start_paused = true)]
async fn partial_when_one_source_fails_and_one_is_skipped() {
    let (a, _a_ctl) = source("a", returns(&[("industry", json!("software"))])).await;
    let (b, b_ctl) = source("b", transient("b")).await;
    let (c, c_ctl) = source("c", returns(&[("industry", json!("hardware"))])).await;

    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::default()));
    for _ in 0..CircuitBreakerConfig::default().failure_threshold {
        breaker.record_failure(SourceKey::new("c"));
    }

    let collector = Collector::builder()
        .with_source(a)
        .with_source(b)
        .with_source(c)
        .with_circuit_breaker(breaker)
        .build()
        .unwrap();

    let Collection { profile, report } = collector.collect(&acme()).await;

    assert_eq!(report.overall_status, OverallStatus::Partial);
    assert_eq!(profile.len(), 1);
    assert_eq!(profile.value("industry"), Some(&json!("software")));
    assert_eq!(profile.provenance("industry"), Some("a"));

    let (kind, detail) = failure_detail(report.result("b"));
    assert_eq!(kind, ErrorKind::Transient);
    assert_eq!(detail, RETRIES_EXHAUSTED);
    assert_eq!(b_ctl.calls().await, 3);

    assert!(matches!(
        report.result("c"),
        Some(SourceResult::Skipped {
            reason: SkipReason::CircuitOpen { .. }
        })
    ));
    assert_eq!(c_ctl.calls().await, 0);
    assert_eq!(report.unsuccessful_sources(), vec!["b", "c"]);
    assert_eq!(report.exit_code(), 0);
}

#[tokio::test]
async fn full_success_prefers_higher_priority_source() {
    let (a, _a) = source("a", returns(&[("employee_count", json!(500))])).await;
    let (b, _b) = source(
        "b",
        returns(&[("employee_count", json!(480)), ("industry", json!("software"))]),
    )
    .await;

    let collector = Collector::builder()
        .with_source(b.clone())
        .with_source(a.clone())
        .prefer_sources(&[a, b])
        .build()
        .unwrap();

    let Collection { profile, report } = collector.collect(&acme()).await;

    assert_eq!(report.overall_status, OverallStatus::Complete);
    let employees = profile.get("employee_count").unwrap();
    assert_eq!(employees.value, json!(500));
    assert_eq!(employees.provenance, "a");
    assert!((employees.confidence - 0.5).abs() < f64::EPSILON);
    assert_eq!(profile.provenance("industry"), Some("b"));
    assert!(report.sources.values().all(|r| !r.from_cache));
}

#[tokio::test(start_paused = true)]
async fn total_failure_yields_empty_profile() {
    let (a, a_ctl) = source("a", transient("a")).await;
    let (b, b_ctl) = source("b", transient("b")).await;
    let (c, c_ctl) = source("c", transient("c")).await;

    let collector = Collector::builder()
        .with_source(a)
        .with_source(b)
        .with_source(c)
        .backoff(quick_backoff())
        .build()
        .unwrap();

    let Collection { profile, report } = collector.collect(&acme()).await;

    assert_eq!(report.overall_status, OverallStatus::Failed);
    assert!(profile.is_empty());
    assert_eq!(report.exit_code(), 1);
    for ctl in [&a_ctl, &b_ctl, &c_ctl] {
        assert_eq!(ctl.calls().await, 3);
    }
    for name in ["a", "b", "c"] {
        assert_eq!(failure_detail(report.result(name)).0, ErrorKind::Transient);
    }
}

#[tokio::test(start_paused = true)]
async fn collection_timeout_keeps_finished_sources() {
    let (a, _a) = source("a", returns(&[("industry", json!("software"))])).await;
    let (b, _b) = source(
        "b",
        MockBehavior::ReturnAfter(
            Duration::from_millis(200),
            crate::helpers::record(&[("employee_count", json!(42))]),
        ),
    )
    .await;
    let (c, c_ctl) = source("c", MockBehavior::Hang).await;

    let collector = Collector::builder()
        .with_source(a)
        .with_source(b)
        .with_source(c)
        .collection_timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    let Collection { profile, report } = collector.collect(&acme()).await;

    let (kind, detail) = failure_detail(report.result("c"));
    assert_eq!(kind, ErrorKind::Timeout);
    assert_eq!(detail, "collection timed out");
    assert_eq!(c_ctl.calls().await, 1);

    assert_eq!(profile.value("industry"), Some(&json!("software")));
    assert_eq!(profile.value("employee_count"), Some(&json!(42)));
    assert_eq!(report.overall_status, OverallStatus::Partial);
    assert!(report.elapsed_ms >= 2_000);
}

#[tokio::test]
async fn required_source_failure_fails_collection() {
    let (a, _a) = source("a", returns(&[("industry", json!("software"))])).await;
    let (b, b_ctl) = source(
        "b",
        MockBehavior::Fail(prospect::ProspectError::auth("b", "invalid token")),
    )
    .await;

    let collector = Collector::builder()
        .with_source(a)
        .with_source(b)
        .required_source("b")
        .build()
        .unwrap();

    let Collection { profile, report } = collector.collect(&acme()).await;

    assert_eq!(report.overall_status, OverallStatus::Failed);
    assert!(report.sources["b"].required);
    assert_eq!(failure_detail(report.result("b")).0, ErrorKind::AuthError);
    assert_eq!(b_ctl.calls().await, 1);
    // Data that did arrive is still merged.
    assert_eq!(profile.value("industry"), Some(&json!("software")));
}

#[tokio::test]
async fn not_found_is_an_empty_success() {
    let (a, _a) = source("a", returns(&[("industry", json!("software"))])).await;
    let (b, b_ctl) = source(
        "b",
        MockBehavior::Fail(prospect::ProspectError::not_found("organization acme.io")),
    )
    .await;

    let collector = Collector::builder()
        .with_source(a)
        .with_source(b)
        .build()
        .unwrap();

    let Collection { report, .. } = collector.collect(&acme()).await;

    assert_eq!(report.overall_status, OverallStatus::Complete);
    assert!(matches!(
        report.result("b"),
        Some(SourceResult::Success {
            data: RawSourceData::Empty,
            ..
        })
    ));
    assert_eq!(b_ctl.calls().await, 1);
}

#[tokio::test]
async fn analyze_parses_identifier_and_uses_fixture_sources() {
    let mut builder = Collector::builder();
    for s in prospect_mock::MockSource::all() {
        builder = builder.with_source(Arc::new(s));
    }
    let database: Arc<dyn SourceClient> =
        Arc::new(prospect_mock::MockSource::new(SourceKey::COMPANY_DATABASE));
    let collector = builder
        .prefer_for_field("employee_count", &[database])
        .build()
        .unwrap();

    let Collection { profile, report } = collector.analyze("https://www.acme.io/about").await.unwrap();
    assert_eq!(report.company.as_str(), "acme.io");
    assert_eq!(report.overall_status, OverallStatus::Complete);
    assert_eq!(report.sources.len(), 4);
    assert_eq!(profile.value("employee_count"), Some(&json!(250)));
    assert_eq!(profile.provenance("employee_count"), Some("company_database"));

    let err = collector.analyze("   ").await.unwrap_err();
    assert!(matches!(err, prospect::ProspectError::InvalidArg(_)));
}
