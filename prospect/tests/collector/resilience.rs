use std::sync::Arc;
use std::time::Duration;

use prospect::{
    CircuitBreaker, CircuitBreakerConfig, Collector, ErrorKind, ProspectError, RateLimitConfig,
    RateLimiter, SkipReason, SourceKey, SourceResult,
};
use prospect_mock::MockBehavior;
use serde_json::json;

use crate::helpers::{acme, failure_detail, quick_backoff, record, returns, source, transient};

#[tokio::test(start_paused = true)]
async fn slow_attempts_time_out_and_are_retried() {
    let (a, a_ctl) = source(
        "a",
        MockBehavior::ReturnAfter(Duration::from_secs(5), record(&[("industry", json!("x"))])),
    )
    .await;

    let collector = Collector::builder()
        .with_source(a)
        .retry_attempts(2)
        .backoff(quick_backoff())
        .source_timeout(Duration::from_secs(1))
        .build()
        .unwrap();

    let report = collector.collect(&acme()).await.report;
    let (kind, detail) = failure_detail(report.result("a"));
    assert_eq!(kind, ErrorKind::Transient);
    assert!(detail.contains("timed out"), "detail: {detail}");
    assert_eq!(a_ctl.calls().await, 2);
}

#[tokio::test]
async fn auth_errors_are_not_retried() {
    let (a, a_ctl) = source(
        "a",
        MockBehavior::Fail(ProspectError::auth("a", "bad credentials")),
    )
    .await;
    let collector = Collector::builder().with_source(a).build().unwrap();

    let report = collector.collect(&acme()).await.report;
    assert_eq!(failure_detail(report.result("a")).0, ErrorKind::AuthError);
    assert_eq!(a_ctl.calls().await, 1);
}

#[tokio::test(start_paused = true)]
async fn circuit_opens_mid_collection_and_skips_the_next_one() {
    let (a, a_ctl) = source("a", transient("a")).await;
    let collector = Collector::builder()
        .with_source(a)
        .retry_attempts(3)
        .backoff(quick_backoff())
        .cache_enabled(false)
        .circuit_breaker(CircuitBreakerConfig {
            failure_threshold: 2,
            cooldown: Duration::from_secs(30),
            max_cooldown: Duration::from_secs(120),
        })
        .build()
        .unwrap();

    let first = collector.collect(&acme()).await.report;
    assert_eq!(failure_detail(first.result("a")).0, ErrorKind::CircuitOpen);
    assert_eq!(a_ctl.calls().await, 2);

    let second = collector.collect(&acme()).await.report;
    match second.result("a") {
        Some(SourceResult::Skipped {
            reason: SkipReason::CircuitOpen { reset_in_ms },
        }) => assert!(*reset_in_ms <= 30_000),
        other => panic!("expected circuit-open skip, got {other:?}"),
    }
    assert_eq!(a_ctl.calls().await, 2);

    // After the cooldown a single probe goes through and closes the circuit.
    a_ctl.set_default_behavior(returns(&[("industry", json!("software"))])).await;
    tokio::time::advance(Duration::from_secs(31)).await;
    let third = collector.collect(&acme()).await.report;
    assert!(third.result("a").is_some_and(SourceResult::is_usable));
    assert_eq!(a_ctl.calls().await, 3);
}

#[tokio::test]
async fn skipped_sources_consume_no_rate_limit_tokens() {
    let (a, a_ctl) = source("a", returns(&[("industry", json!("software"))])).await;
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        requests_per_minute: 1,
        burst_limit: 1,
        wait_timeout: Duration::ZERO,
    }));
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: 1,
        ..CircuitBreakerConfig::default()
    }));
    breaker.record_failure(SourceKey::new("a"));

    let collector = Collector::builder()
        .with_source(a)
        .with_rate_limiter(Arc::clone(&limiter))
        .with_circuit_breaker(breaker)
        .build()
        .unwrap();

    let report = collector.collect(&acme()).await.report;
    assert!(matches!(
        report.result("a"),
        Some(SourceResult::Skipped { .. })
    ));
    assert_eq!(a_ctl.calls().await, 0);
    assert!(limiter.try_acquire(SourceKey::new("a")).is_ok());
}

#[tokio::test(start_paused = true)]
async fn collector_waits_for_rate_limit_refill() {
    let (a, a_ctl) = source("a", returns(&[("industry", json!("software"))])).await;
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        requests_per_minute: 60,
        burst_limit: 1,
        wait_timeout: Duration::from_secs(5),
    }));
    // Drain the single token so the collector has to wait for a refill.
    let _drained = limiter.try_acquire(SourceKey::new("a")).unwrap();

    let collector = Collector::builder()
        .with_source(a)
        .with_rate_limiter(limiter)
        .build()
        .unwrap();

    let report = collector.collect(&acme()).await.report;
    assert!(report.result("a").is_some_and(SourceResult::is_usable));
    assert_eq!(a_ctl.calls().await, 1);
    assert!(report.elapsed_ms >= 1_000);
}

#[tokio::test(start_paused = true)]
async fn max_parallelism_bounds_concurrent_fetches() {
    let slow = || {
        MockBehavior::ReturnAfter(
            Duration::from_millis(100),
            record(&[("industry", json!("software"))]),
        )
    };
    let (a, _a) = source("a", slow()).await;
    let (b, _b) = source("b", slow()).await;

    let concurrent = Collector::builder()
        .with_source(Arc::clone(&a))
        .with_source(Arc::clone(&b))
        .cache_enabled(false)
        .build()
        .unwrap();
    let report = concurrent.collect(&acme()).await.report;
    assert!(report.elapsed_ms < 200, "elapsed {}", report.elapsed_ms);

    let serial = Collector::builder()
        .with_source(a)
        .with_source(b)
        .cache_enabled(false)
        .max_parallelism(1)
        .build()
        .unwrap();
    let report = serial.collect(&acme()).await.report;
    assert!(report.elapsed_ms >= 200, "elapsed {}", report.elapsed_ms);
}

#[tokio::test]
async fn collect_from_limits_the_run_to_selected_sources() {
    let (a, a_ctl) = source("a", returns(&[("industry", json!("software"))])).await;
    let (b, b_ctl) = source("b", returns(&[("employee_count", json!(10))])).await;
    let collector = Collector::builder()
        .with_source(a)
        .with_source(b)
        .build()
        .unwrap();

    let collection = collector
        .collect_from(&acme(), &[SourceKey::new("a"), SourceKey::new("a")])
        .await
        .unwrap();
    assert_eq!(collection.report.sources.len(), 1);
    assert!(collection.profile.value("employee_count").is_none());
    assert_eq!(a_ctl.calls().await, 1);
    assert_eq!(b_ctl.calls().await, 0);

    let err = collector
        .collect_from(&acme(), &[SourceKey::new("zzz")])
        .await
        .unwrap_err();
    assert!(matches!(err, ProspectError::InvalidArg(_)));
    let err = collector.collect_from(&acme(), &[]).await.unwrap_err();
    assert!(matches!(err, ProspectError::InvalidArg(_)));
}
