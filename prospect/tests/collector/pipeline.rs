use std::sync::Arc;

use async_trait::async_trait;
use prospect::{
    Analysis, Analyzer, Collector, CollectionReport, CompanyProfile, JsonReport, OverallStatus,
    ProfileSummary, ProspectError, ProspectPipeline,
};
use prospect_mock::MockSource;
use serde_json::{Value, json};

use crate::helpers::{returns, source, transient};

struct BrokenAnalyzer;

#[async_trait]
impl Analyzer for BrokenAnalyzer {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn analyze(
        &self,
        _profile: &CompanyProfile,
        _report: &CollectionReport,
    ) -> Result<Analysis, ProspectError> {
        Err(ProspectError::Data("model unavailable".into()))
    }
}

fn fixture_collector() -> Arc<Collector> {
    let mut builder = Collector::builder();
    for s in MockSource::all() {
        builder = builder.with_source(Arc::new(s));
    }
    Arc::new(builder.build().unwrap())
}

#[tokio::test]
async fn pipeline_analyzes_and_renders_json() {
    let pipeline = ProspectPipeline::new(fixture_collector())
        .with_analyzer(Arc::new(ProfileSummary))
        .with_generator(Arc::new(JsonReport));

    let out = pipeline.run("globex.com").await.unwrap();
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
    // The professional network has no globex page: an empty success.
    assert_eq!(out.collection.report.overall_status, OverallStatus::Complete);

    let analysis = out.analysis.unwrap();
    assert_eq!(analysis.analyzer, "profile_summary");
    assert!(analysis.summary.contains("from 4 source(s)"), "{}", analysis.summary);
    assert!(analysis.findings.contains_key("provenance"));

    let rendered = out.rendered.unwrap();
    assert_eq!(rendered.content_type, "application/json");
    let doc: Value = serde_json::from_str(&rendered.body).unwrap();
    assert_eq!(doc["profile"]["industry"]["value"], json!("Logistics"));
    assert_eq!(doc["report"]["overall_status"], json!("complete"));
}

#[tokio::test]
async fn analyzer_failure_keeps_the_collection() {
    let pipeline = ProspectPipeline::new(fixture_collector())
        .with_analyzer(Arc::new(BrokenAnalyzer))
        .with_generator(Arc::new(JsonReport));

    let out = pipeline.run("acme.io").await.unwrap();
    assert_eq!(out.collection.report.overall_status, OverallStatus::Complete);
    assert!(!out.collection.profile.is_empty());
    assert!(out.analysis.is_none());
    assert!(out.rendered.is_none());
    assert_eq!(out.warnings.len(), 2);
    assert!(out.warnings[0].contains("model unavailable"));
}

#[tokio::test(start_paused = true)]
async fn summary_tolerates_failed_collections() {
    let (a, _) = source("a", transient("a")).await;
    let (b, _) = source("b", returns(&[])).await;
    let collector = Collector::builder()
        .with_source(a)
        .with_source(b)
        .build()
        .unwrap();
    let pipeline = ProspectPipeline::new(Arc::new(collector)).with_analyzer(Arc::new(ProfileSummary));

    let out = pipeline.run("acme.io").await.unwrap();
    assert_eq!(out.collection.report.overall_status, OverallStatus::Failed);
    let analysis = out.analysis.unwrap();
    assert!(analysis.summary.contains("collection failed"), "{}", analysis.summary);
    assert_eq!(analysis.findings["unavailable_sources"], json!(["a"]));
}

#[tokio::test]
async fn pipeline_rejects_blank_input() {
    let pipeline = ProspectPipeline::new(fixture_collector());
    let err = pipeline.run("  ").await.unwrap_err();
    assert!(matches!(err, ProspectError::InvalidArg(_)));
}
