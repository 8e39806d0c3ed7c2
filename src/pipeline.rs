//! Pipeline orchestration
//!
//! Sequences the analysis stages in a fixed order, wraps every stage in the
//! resilient executor with a schema-valid fallback, and persists the output
//! triple. A run that falls back in places still completes and still writes
//! valid outputs; only an unrecoverable configuration problem (a missing
//! input file, an unwritable output directory) terminates it.

use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{info, warn};

use crate::complexity::ComplexityScorer;
use crate::creative::{self, Creative};
use crate::drift::{BaselinePolicy, BaselineStore, DriftDetector, DriftReport};
use crate::error::StageError;
use crate::evaluator::{Evaluator, ValidationResult};
use crate::insight::{Insight, InsightEngine, SCHEMA_VERSION};
use crate::planner::{self, Plan};
use crate::report;
use crate::resilience::{self, RetryPolicy};
use crate::schema::{PayloadKind, SchemaGovernor};
use crate::summary::{self, DatasetSummary};

/// Default number of creative sets emitted per run.
const DEFAULT_TOP_N_CREATIVES: usize = 3;

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub query: String,
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub baseline_path: PathBuf,
    pub drift_enabled: bool,
    pub recent_days: i64,
    pub baseline_policy: BaselinePolicy,
    pub retry: RetryPolicy,
}

impl PipelineConfig {
    pub fn new(query: impl Into<String>, input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        Self {
            query: query.into(),
            input: input.into(),
            baseline_path: output_dir.join("baseline_stats.json"),
            output_dir,
            drift_enabled: true,
            recent_days: 14,
            baseline_policy: BaselinePolicy::Always,
            retry: RetryPolicy::default(),
        }
    }
}

/// Everything one run produced, returned for reporting and tests.
#[derive(Debug)]
pub struct RunOutcome {
    pub plan: Plan,
    pub summary: DatasetSummary,
    pub insights: Vec<Insight>,
    pub validated: Vec<ValidationResult>,
    pub creatives: Vec<Creative>,
    pub drift: Option<DriftReport>,
    /// Whether both persisted payloads passed schema governance
    pub outputs_valid: bool,
    pub insights_path: PathBuf,
    pub creatives_path: PathBuf,
    pub report_path: PathBuf,
}

/// Run the full pipeline, start to finish, for one dataset.
pub fn run(config: &PipelineConfig) -> Result<RunOutcome, StageError> {
    if !config.input.exists() {
        // Configuration error, not a stage failure: fail loud.
        return Err(StageError::data(format!(
            "input file not found: {}",
            config.input.display()
        )));
    }

    // Stage: data loading and summarization.
    let summary_value = resilience::execute(
        "load_and_summarize",
        &config.retry,
        Some(DatasetSummary::fallback()),
        || summary::from_csv(&config.input, config.recent_days),
    )?;
    info!(
        campaigns = summary_value.campaigns.len(),
        roas_drops = summary_value.roas_drop_campaigns.len(),
        ctr_drops = summary_value.ctr_drop_campaigns.len(),
        date_range = %summary_value.date_range,
        "dataset summarized"
    );

    // Stage: complexity assessment and planning.
    let complexity = ComplexityScorer::default().score(&summary_value);
    info!(
        score = complexity.score,
        band = ?complexity.band,
        "complexity assessed"
    );
    let fallback_plan = planner::plan("", &complexity);
    let plan = resilience::execute("planning", &config.retry, Some(fallback_plan), || {
        Ok(planner::plan(&config.query, &complexity))
    })?;
    info!(steps = plan.steps.len(), adaptation = %plan.adaptation, "plan generated");

    // Stage: drift detection against the persisted baseline.
    let store = BaselineStore::new(&config.baseline_path);
    let detector = DriftDetector::default();
    let current_stats = detector.compute_stats(&summary_value);
    let drift = if config.drift_enabled {
        let baseline = match store.load() {
            Ok(baseline) => baseline,
            Err(err) => {
                warn!(error = %err, "baseline unreadable, proceeding without one");
                None
            }
        };
        let report = detector.detect_drift(&current_stats, baseline.as_ref());
        if report.has_drift {
            warn!(severity = ?report.severity, detections = report.detections.len(), "drift detected");
        } else {
            info!("no significant drift from baseline");
        }
        Some(report)
    } else {
        None
    };

    // Stage: hypothesis generation.
    let engine = InsightEngine::default();
    let insights = resilience::execute("generate_insights", &config.retry, Some(Vec::new()), || {
        let generated = engine.generate(&summary_value);
        if generated.is_empty() {
            info!("no metric move cleared the significance threshold");
        }
        Ok(generated)
    })?;
    info!(count = insights.len(), "insights generated");

    // Stage: independent validation.
    let evaluator = Evaluator::default();
    let validated = resilience::execute("validate_insights", &config.retry, Some(Vec::new()), || {
        Ok(evaluator.validate(&insights, &summary_value))
    })?;
    let flagged = validated.iter().filter(|v| v.needs_review).count();
    info!(count = validated.len(), flagged, "insights validated");

    // Stage: creative recommendations.
    let creatives = resilience::execute("generate_creatives", &config.retry, Some(Vec::new()), || {
        Ok(creative::generate(&validated, DEFAULT_TOP_N_CREATIVES))
    })?;
    info!(count = creatives.len(), "creatives generated");

    // Stage: schema governance over both persisted payloads.
    let governor = SchemaGovernor;
    let insights_payload = governor.upgrade(
        &json!({ "insights": insights, "schema_version": SCHEMA_VERSION }),
        PayloadKind::Insights,
    );
    let creatives_payload = governor.upgrade(
        &json!({ "creatives": creatives, "schema_version": SCHEMA_VERSION }),
        PayloadKind::Creatives,
    );
    let insights_report = governor.validate(&insights_payload, PayloadKind::Insights);
    let creatives_report = governor.validate(&creatives_payload, PayloadKind::Creatives);
    for violation in insights_report
        .violations
        .iter()
        .chain(&creatives_report.violations)
    {
        warn!(field = %violation.field_path, message = %violation.message, "schema violation");
    }
    let outputs_valid = insights_report.is_valid && creatives_report.is_valid;

    // Persistence. Validation warnings never block it.
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| StageError::data_with("cannot create output directory", e))?;
    let insights_path = config.output_dir.join("insights.json");
    let creatives_path = config.output_dir.join("creatives.json");
    let report_path = config.output_dir.join("report.md");

    write_json(&insights_path, &insights_payload)?;
    write_json(&creatives_path, &creatives_payload)?;
    let report_text = report::render(&summary_value, &insights, &validated, &creatives, drift.as_ref());
    std::fs::write(&report_path, report_text)
        .map_err(|e| StageError::data_with("cannot write report", e))?;
    info!(
        insights = %insights_path.display(),
        creatives = %creatives_path.display(),
        report = %report_path.display(),
        "outputs persisted"
    );

    // Baseline acceptance is the caller's policy, applied here.
    let accept = match config.baseline_policy {
        BaselinePolicy::Always => true,
        BaselinePolicy::OnValidRun => outputs_valid,
        BaselinePolicy::Never => false,
    };
    if config.drift_enabled && accept {
        store.save(&current_stats)?;
    }

    Ok(RunOutcome {
        plan,
        summary: summary_value,
        insights,
        validated,
        creatives,
        drift,
        outputs_valid,
        insights_path,
        creatives_path,
        report_path,
    })
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<(), StageError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| StageError::data_with("cannot serialize output", e))?;
    std::fs::write(path, text)
        .map_err(|e| StageError::data_with(format!("cannot write {}", path.display()), e))
}
