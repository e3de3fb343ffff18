use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use prospect_core::{
    BackoffConfig, CircuitBreakerConfig, CompanyIdentifier, ErrorKind, ProspectError,
    RawSourceData, SourceClient, SourceKey, SourceRequest, SourceResult,
};
use prospect_middleware::{
    CircuitBreaker, CircuitPhase, RETRIES_EXHAUSTED, RetryExecutor, RetryPolicy,
};
use prospect_mock::{DynamicMockSource, MockBehavior};
use tokio::time::Instant;

const SRC: SourceKey = SourceKey::PROFESSIONAL_NETWORK;

fn company() -> CompanyIdentifier {
    CompanyIdentifier::parse("acme.io").unwrap()
}

fn executor(max_attempts: u32, threshold: u32) -> RetryExecutor {
    let policy = RetryPolicy {
        max_attempts,
        backoff: BackoffConfig {
            min_backoff_ms: 100,
            max_backoff_ms: 1_000,
            factor: 2,
            jitter_percent: 0,
        },
        rate_limited_wait: Duration::from_secs(1),
        ..RetryPolicy::default()
    };
    let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: threshold,
        cooldown: Duration::from_secs(30),
        max_cooldown: Duration::from_secs(300),
    }));
    RetryExecutor::new(policy, breaker)
}

/// Operation failing with `err` for the first `failures` calls, then answering `Empty`.
fn flaky(
    calls: &Arc<AtomicU32>,
    failures: u32,
    err: ProspectError,
) -> impl FnMut(SourceRequest) -> std::future::Ready<Result<RawSourceData, ProspectError>> {
    let calls = Arc::clone(calls);
    move |req: SourceRequest| {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        assert_eq!(req.attempt, n);
        std::future::ready(if n <= failures {
            Err(err.clone())
        } else {
            Ok(RawSourceData::Empty)
        })
    }
}

#[tokio::test(start_paused = true)]
async fn transient_failures_are_retried_with_backoff() {
    let exec = executor(3, 10);
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();
    let res = exec
        .execute(SRC, &company(), flaky(&calls, 2, ProspectError::transient("pn", "503")))
        .await;
    assert!(res.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 100ms then 200ms
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(exec.breaker().snapshot(SRC).consecutive_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn attempts_are_bounded_and_exhaustion_is_transient() {
    let exec = executor(3, 10);
    let calls = Arc::new(AtomicU32::new(0));
    let res = exec
        .execute(SRC, &company(), flaky(&calls, u32::MAX, ProspectError::transient("pn", "503")))
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match res {
        SourceResult::Failure { kind, detail } => {
            assert_eq!(kind, ErrorKind::Transient);
            assert_eq!(detail, RETRIES_EXHAUSTED);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn auth_errors_are_not_retried() {
    let exec = executor(5, 10);
    let calls = Arc::new(AtomicU32::new(0));
    let res = exec
        .execute(SRC, &company(), flaky(&calls, u32::MAX, ProspectError::auth("pn", "401")))
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(res.error_kind(), Some(ErrorKind::AuthError));
}

#[tokio::test(start_paused = true)]
async fn not_found_is_an_empty_success() {
    let exec = executor(5, 1);
    let calls = Arc::new(AtomicU32::new(0));
    let res = exec
        .execute(SRC, &company(), flaky(&calls, u32::MAX, ProspectError::not_found("org")))
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(res.data().map(|(d, _)| d.clone()), Some(RawSourceData::Empty));
    assert_eq!(exec.breaker().snapshot(SRC).phase, CircuitPhase::Closed);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_waits_for_the_longer_of_limiter_and_hint() {
    let exec = executor(3, 10);
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();
    let res = exec
        .execute(SRC, &company(), flaky(&calls, 1, ProspectError::rate_limited("pn", 3_000)))
        .await;
    assert!(res.is_success());
    assert!(started.elapsed() >= Duration::from_secs(3));

    let started = Instant::now();
    let calls = Arc::new(AtomicU32::new(0));
    exec.execute(SRC, &company(), flaky(&calls, 1, ProspectError::rate_limited("pn", 0)))
        .await;
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn circuit_opening_mid_retry_stops_and_later_calls_short_circuit() {
    let exec = executor(5, 2);
    let calls = Arc::new(AtomicU32::new(0));
    let res = exec
        .execute(SRC, &company(), flaky(&calls, u32::MAX, ProspectError::transient("pn", "503")))
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(res.error_kind(), Some(ErrorKind::CircuitOpen));

    let calls = Arc::new(AtomicU32::new(0));
    let res = exec
        .execute(SRC, &company(), flaky(&calls, 0, ProspectError::transient("pn", "503")))
        .await;
    assert_eq!(calls.load(Ordering::SeqCst), 0, "operation not invoked while open");
    assert_eq!(res.error_kind(), Some(ErrorKind::CircuitOpen));
}

#[tokio::test(start_paused = true)]
async fn drives_a_source_client() {
    let exec = executor(3, 10);
    let (source, ctrl) = DynamicMockSource::new_with_controller("professional_network");
    ctrl.push_behaviors([MockBehavior::Fail(ProspectError::transient("pn", "reset"))])
        .await;
    ctrl.set_default_behavior(MockBehavior::Return(RawSourceData::Articles(vec![])))
        .await;

    let res = exec
        .execute(SRC, &company(), |req: SourceRequest| {
            let source = Arc::clone(&source);
            async move { source.fetch(&req.company).await }
        })
        .await;
    assert!(res.is_success());
    assert_eq!(ctrl.calls().await, 2);
}
