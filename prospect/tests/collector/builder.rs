use std::time::Duration;

use prospect::{Collector, CollectorBuilder, CollectorConfig, ProspectError};
use serde_json::json;

use crate::helpers::{returns, source};

fn build_err(builder: CollectorBuilder) -> ProspectError {
    match builder.build() {
        Ok(_) => panic!("expected build to fail"),
        Err(e) => e,
    }
}

#[test]
fn build_requires_a_source() {
    let err = build_err(Collector::builder());
    assert!(matches!(err, ProspectError::InvalidArg(_)));
}

#[tokio::test]
async fn build_rejects_duplicate_source_names() {
    let (a1, _) = source("a", returns(&[])).await;
    let (a2, _) = source("a", returns(&[])).await;
    let err = build_err(Collector::builder().with_source(a1).with_source(a2));
    assert!(err.to_string().contains("more than once"), "{err}");
}

#[tokio::test]
async fn build_validates_configuration() {
    let (a, _) = source("a", returns(&[])).await;
    let err = build_err(Collector::builder().with_source(a.clone()).retry_attempts(0));
    assert!(matches!(err, ProspectError::InvalidArg(_)));

    let err = build_err(
        Collector::builder()
            .with_source(a.clone())
            .collection_timeout(Duration::ZERO),
    );
    assert!(matches!(err, ProspectError::InvalidArg(_)));

    let err = build_err(Collector::builder().with_source(a).max_parallelism(0));
    assert!(matches!(err, ProspectError::InvalidArg(_)));
}

#[tokio::test]
async fn build_rejects_unknown_or_contradictory_source_settings() {
    let (a, _) = source("a", returns(&[])).await;
    let err = build_err(Collector::builder().with_source(a.clone()).required_source("b"));
    assert!(err.to_string().contains("not registered"), "{err}");

    let err = build_err(Collector::builder().with_source(a.clone()).disable_source("b"));
    assert!(err.to_string().contains("not registered"), "{err}");

    let err = build_err(
        Collector::builder()
            .with_source(a)
            .required_source("a")
            .disable_source("a"),
    );
    assert!(err.to_string().contains("both required and disabled"), "{err}");
}

#[tokio::test]
async fn builder_preferences_land_in_config() {
    let (a, _) = source("a", returns(&[("industry", json!("x"))])).await;
    let (b, _) = source("b", returns(&[("industry", json!("y"))])).await;

    let collector = Collector::builder()
        .config(CollectorConfig {
            retry_attempts: 5,
            ..CollectorConfig::default()
        })
        .with_source(a.clone())
        .with_source(b.clone())
        .prefer_sources(&[a.clone(), b.clone()])
        .prefer_for_field("industry", &[b, a])
        .required_source("a")
        .required_source("a")
        .build()
        .unwrap();

    let cfg = collector.config();
    assert_eq!(cfg.retry_attempts, 5);
    assert_eq!(cfg.required_sources, vec!["a".to_string()]);
    assert!(cfg.priority.rank("industry", "b") < cfg.priority.rank("industry", "a"));
    assert!(cfg.priority.rank("employee_count", "a") < cfg.priority.rank("employee_count", "b"));
    assert_eq!(collector.source_names(), vec!["a", "b"]);
}

#[tokio::test]
async fn field_preference_decides_merge_winner() {
    let (a, _) = source("a", returns(&[("industry", json!("software"))])).await;
    let (b, _) = source("b", returns(&[("industry", json!("robotics"))])).await;
    let collector = Collector::builder()
        .with_source(a.clone())
        .with_source(b.clone())
        .prefer_sources(&[a.clone(), b.clone()])
        .prefer_for_field("industry", &[b])
        .build()
        .unwrap();

    let profile = collector.collect(&crate::helpers::acme()).await.profile;
    assert_eq!(profile.value("industry"), Some(&json!("robotics")));
    assert_eq!(profile.provenance("industry"), Some("b"));
}
