//! Downstream boundaries: analysis and report rendering.
//!
//! The collector stops at a [`Collection`]. Consumers plug an [`Analyzer`] and
//! a [`ReportGenerator`] into a [`ProspectPipeline`], which runs
//! collect → analyze → render and never lets a downstream failure discard the
//! collected data.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prospect_core::{
    Collection, CollectionReport, CompanyIdentifier, CompanyProfile, OverallStatus, ProspectError,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::Collector;

/// Output of an [`Analyzer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// Name of the analyzer that produced it.
    pub analyzer: String,
    /// One-paragraph summary.
    pub summary: String,
    /// Structured findings keyed by topic.
    pub findings: BTreeMap<String, Value>,
    /// When the analysis ran.
    pub generated_at: DateTime<Utc>,
}

/// Output of a [`ReportGenerator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedReport {
    /// Media type of `body`, e.g. `application/json`.
    pub content_type: String,
    /// Rendered document.
    pub body: String,
}

/// Turns a merged profile into an analysis.
///
/// Implementations must tolerate missing fields: a partial or failed
/// collection still reaches the analyzer.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Stable identifier used in warnings and in [`Analysis::analyzer`].
    fn name(&self) -> &'static str;

    /// Analyze a profile together with the report explaining it.
    ///
    /// # Errors
    /// Returns an error when the analysis cannot be produced.
    async fn analyze(
        &self,
        profile: &CompanyProfile,
        report: &CollectionReport,
    ) -> Result<Analysis, ProspectError>;
}

/// Renders an analysis and its collection into a document.
#[async_trait]
pub trait ReportGenerator: Send + Sync {
    /// Stable identifier used in warnings.
    fn name(&self) -> &'static str;

    /// Render a report.
    ///
    /// # Errors
    /// Returns an error when the report cannot be rendered.
    async fn render(
        &self,
        analysis: &Analysis,
        collection: &Collection,
    ) -> Result<RenderedReport, ProspectError>;
}

/// Analyzer that summarizes which fields were found and where they came from.
///
/// Needs no external service; useful as a default and in demos.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileSummary;

#[async_trait]
impl Analyzer for ProfileSummary {
    fn name(&self) -> &'static str {
        "profile_summary"
    }

    async fn analyze(
        &self,
        profile: &CompanyProfile,
        report: &CollectionReport,
    ) -> Result<Analysis, ProspectError> {
        let display = profile
            .value("name")
            .and_then(Value::as_str)
            .map_or_else(|| report.company.to_string(), str::to_string);
        let status = match report.overall_status {
            OverallStatus::Complete => "complete",
            OverallStatus::Partial => "partial",
            OverallStatus::Failed => "failed",
        };
        let summary = format!(
            "{display}: {} field(s) from {} source(s), collection {status}",
            profile.len(),
            report.sources.len()
        );

        let mut findings = BTreeMap::new();
        let provenance: serde_json::Map<String, Value> = profile
            .iter()
            .map(|(field, f)| (field.to_string(), Value::String(f.provenance.clone())))
            .collect();
        findings.insert("provenance".to_string(), Value::Object(provenance));
        let low_confidence: Vec<Value> = profile
            .iter()
            .filter(|(_, f)| f.confidence < 1.0)
            .map(|(field, _)| Value::String(field.to_string()))
            .collect();
        if !low_confidence.is_empty() {
            findings.insert("conflicting_fields".to_string(), Value::Array(low_confidence));
        }
        let missing: Vec<Value> = report
            .unsuccessful_sources()
            .into_iter()
            .map(|s| Value::String(s.to_string()))
            .collect();
        if !missing.is_empty() {
            findings.insert("unavailable_sources".to_string(), Value::Array(missing));
        }

        Ok(Analysis {
            analyzer: self.name().to_string(),
            summary,
            findings,
            generated_at: Utc::now(),
        })
    }
}

/// Renders the analysis and the full collection as pretty-printed JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReport;

#[async_trait]
impl ReportGenerator for JsonReport {
    fn name(&self) -> &'static str {
        "json"
    }

    async fn render(
        &self,
        analysis: &Analysis,
        collection: &Collection,
    ) -> Result<RenderedReport, ProspectError> {
        let doc = serde_json::json!({
            "analysis": analysis,
            "profile": collection.profile,
            "report": collection.report,
        });
        let body = serde_json::to_string_pretty(&doc)
            .map_err(|e| ProspectError::Data(format!("render json: {e}")))?;
        Ok(RenderedReport {
            content_type: "application/json".to_string(),
            body,
        })
    }
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Collected profile and report; always present.
    pub collection: Collection,
    /// Analysis, when an analyzer is configured and succeeded.
    pub analysis: Option<Analysis>,
    /// Rendered report, when a generator is configured and succeeded.
    pub rendered: Option<RenderedReport>,
    /// Downstream failures, one line each.
    pub warnings: Vec<String>,
}

/// Collect → analyze → render.
pub struct ProspectPipeline {
    collector: Arc<Collector>,
    analyzer: Option<Arc<dyn Analyzer>>,
    generator: Option<Arc<dyn ReportGenerator>>,
}

impl ProspectPipeline {
    /// Pipeline that only collects.
    #[must_use]
    pub const fn new(collector: Arc<Collector>) -> Self {
        Self {
            collector,
            analyzer: None,
            generator: None,
        }
    }

    /// Analyze every collection with `analyzer`.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Render every analysis with `generator`.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn ReportGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Collector used by this pipeline.
    #[must_use]
    pub const fn collector(&self) -> &Arc<Collector> {
        &self.collector
    }

    /// Parse `input` and run the pipeline.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `input` is not a usable identifier. Analyzer
    /// and generator failures are reported in [`PipelineOutput::warnings`].
    pub async fn run(&self, input: &str) -> Result<PipelineOutput, ProspectError> {
        let company = CompanyIdentifier::parse(input)?;
        Ok(self.run_for(&company).await)
    }

    /// Run the pipeline for an already parsed company.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "prospect::pipeline::run",
            skip(self),
            fields(company = %company),
        )
    )]
    pub async fn run_for(&self, company: &CompanyIdentifier) -> PipelineOutput {
        let collection = self.collector.collect(company).await;
        let mut warnings = Vec::new();

        let analysis = match &self.analyzer {
            Some(a) => match a.analyze(&collection.profile, &collection.report).await {
                Ok(v) => Some(v),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(analyzer = a.name(), error = %e, "analysis failed");
                    warnings.push(format!("analyzer {}: {e}", a.name()));
                    None
                }
            },
            None => None,
        };

        let rendered = match (&self.generator, &analysis) {
            (Some(g), Some(analysis)) => match g.render(analysis, &collection).await {
                Ok(v) => Some(v),
                Err(e) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(generator = g.name(), error = %e, "rendering failed");
                    warnings.push(format!("generator {}: {e}", g.name()));
                    None
                }
            },
            (Some(g), None) => {
                warnings.push(format!("generator {}: skipped, no analysis", g.name()));
                None
            }
            (None, _) => None,
        };

        PipelineOutput {
            collection,
            analysis,
            rendered,
            warnings,
        }
    }
}
