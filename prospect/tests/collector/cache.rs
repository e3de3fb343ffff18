use std::time::Duration;

use prospect::{Collector, ErrorKind, OverallStatus, SkipReason, SourceResult};
use prospect_mock::MockBehavior;
use serde_json::json;

use crate::helpers::{acme, failure_detail, quick_backoff, returns, source, transient};

#[tokio::test]
async fn second_collection_is_served_from_cache() {
    let (a, a_ctl) = source("a", returns(&[("industry", json!("software"))])).await;
    let collector = Collector::builder().with_source(a).build().unwrap();

    let first = collector.collect(&acme()).await;
    let second = collector.collect(&acme()).await;

    assert!(!first.report.sources["a"].from_cache);
    assert!(second.report.sources["a"].from_cache);
    assert_eq!(first.report.result("a"), second.report.result("a"));
    assert_eq!(first.profile, second.profile);
    assert_eq!(a_ctl.calls().await, 1);
}

#[tokio::test]
async fn disabled_cache_fetches_every_time() {
    let (a, a_ctl) = source("a", returns(&[("industry", json!("software"))])).await;
    let collector = Collector::builder()
        .with_source(a)
        .cache_enabled(false)
        .build()
        .unwrap();

    collector.collect(&acme()).await;
    let second = collector.collect(&acme()).await;

    assert!(!second.report.sources["a"].from_cache);
    assert_eq!(a_ctl.calls().await, 2);
    assert!(collector.cache().is_empty().await);
}

#[tokio::test]
async fn refresh_bypasses_cached_outcomes() {
    let (a, a_ctl) = source("a", returns(&[("industry", json!("software"))])).await;
    let collector = Collector::builder().with_source(a).build().unwrap();

    collector.collect(&acme()).await;
    a_ctl
        .set_default_behavior(returns(&[("industry", json!("robotics"))]))
        .await;
    let refreshed = collector.refresh(&acme()).await;

    assert!(!refreshed.report.sources["a"].from_cache);
    assert_eq!(refreshed.profile.value("industry"), Some(&json!("robotics")));
    assert_eq!(a_ctl.calls().await, 2);
}

#[tokio::test(start_paused = true)]
async fn failures_are_cached_for_the_failure_ttl_only() {
    let (a, a_ctl) = source("a", transient("a")).await;
    let collector = Collector::builder()
        .with_source(a)
        .backoff(quick_backoff())
        .build()
        .unwrap();

    collector.collect(&acme()).await;
    assert_eq!(a_ctl.calls().await, 3);

    let cached = collector.collect(&acme()).await.report;
    assert!(cached.sources["a"].from_cache);
    assert_eq!(failure_detail(cached.result("a")).0, ErrorKind::Transient);
    assert_eq!(a_ctl.calls().await, 3);

    let ttl = collector.config().cache.failure_ttl;
    tokio::time::advance(ttl + Duration::from_secs(1)).await;
    let expired = collector.collect(&acme()).await.report;
    assert!(!expired.sources["a"].from_cache);
    assert!(a_ctl.calls().await > 3);
}

#[tokio::test(start_paused = true)]
async fn collection_timeouts_are_not_cached() {
    let (a, a_ctl) = source("a", MockBehavior::Hang).await;
    let collector = Collector::builder()
        .with_source(a)
        .collection_timeout(Duration::from_secs(1))
        .build()
        .unwrap();

    let first = collector.collect(&acme()).await.report;
    assert_eq!(failure_detail(first.result("a")).0, ErrorKind::Timeout);
    assert_eq!(first.overall_status, OverallStatus::Failed);

    let second = collector.collect(&acme()).await.report;
    assert!(!second.sources["a"].from_cache);
    assert_eq!(a_ctl.calls().await, 2);
}

#[tokio::test]
async fn disabled_sources_are_skipped_without_fetching() {
    let (a, _a) = source("a", returns(&[("industry", json!("software"))])).await;
    let (b, b_ctl) = source("b", returns(&[("employee_count", json!(10))])).await;
    let collector = Collector::builder()
        .with_source(a)
        .with_source(b)
        .disable_source("b")
        .build()
        .unwrap();

    let report = collector.collect(&acme()).await.report;
    assert_eq!(
        report.result("b"),
        Some(&SourceResult::Skipped {
            reason: SkipReason::Disabled
        })
    );
    assert_eq!(report.overall_status, OverallStatus::Partial);
    assert_eq!(b_ctl.calls().await, 0);
}
