//! Baseline statistics and run-over-run drift detection
//!
//! Each accepted run's summary statistics are persisted as the baseline; the
//! next run compares itself against that record dimension by dimension and
//! classifies the drift severity. The store holds at most one baseline and
//! is passed in as a dependency, so nothing here touches ambient global
//! state and the detector never silently replaces its own reference.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StageError;
use crate::stats;
use crate::summary::DatasetSummary;

/// Default per-dimension drift threshold (15%).
pub const DEFAULT_DRIFT_THRESHOLD: f64 = 0.15;
/// Drift at or above this fraction is classified high.
const HIGH_DRIFT: f64 = 0.30;
/// Guard against division by a zero baseline.
const EPSILON: f64 = 1e-9;

/// Distributional statistics for one percent-change series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub q10: f64,
    pub q25: f64,
    pub q75: f64,
    pub q90: f64,
    pub count: usize,
}

impl SeriesStats {
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Some(Self {
            mean: stats::mean(values),
            median: stats::percentile_sorted(&sorted, 50.0),
            std: stats::std_dev(values),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            q10: stats::percentile_sorted(&sorted, 10.0),
            q25: stats::percentile_sorted(&sorted, 25.0),
            q75: stats::percentile_sorted(&sorted, 75.0),
            q90: stats::percentile_sorted(&sorted, 90.0),
            count: values.len(),
        })
    }
}

/// Persisted snapshot of one run's summary statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineStats {
    /// ISO-8601 timestamp of the run that produced this record
    pub run_timestamp: String,
    pub campaign_count: usize,
    pub campaigns: Vec<String>,
    pub roas_drop_count: usize,
    pub ctr_drop_count: usize,
    pub avg_ctr: Option<f64>,
    pub avg_roas: Option<f64>,
    pub total_spend: Option<f64>,
    pub total_revenue: Option<f64>,
    pub roas_changes: Option<SeriesStats>,
    pub ctr_changes: Option<SeriesStats>,
}

/// Drift severity, per dimension and overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftSeverity {
    None,
    Low,
    Medium,
    High,
}

/// One tracked dimension's comparison against the baseline.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    pub metric: &'static str,
    pub baseline_value: f64,
    pub current_value: f64,
    /// Fractional drift, |current - baseline| / max(|baseline|, epsilon)
    pub percent_drift: f64,
    pub severity: DriftSeverity,
}

/// Result of comparing a run against the persisted baseline.
///
/// Returned to the caller for reporting; never persisted itself.
#[derive(Debug, Clone, Serialize)]
pub struct DriftReport {
    pub has_drift: bool,
    pub severity: DriftSeverity,
    pub detections: Vec<Detection>,
}

impl DriftReport {
    fn no_baseline() -> Self {
        Self {
            has_drift: false,
            severity: DriftSeverity::None,
            detections: Vec::new(),
        }
    }
}

/// When a run's statistics replace the stored baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaselinePolicy {
    /// Every completed run becomes the new baseline.
    #[default]
    Always,
    /// Only runs whose persisted outputs passed schema governance.
    OnValidRun,
    /// Compare but never update; the baseline is pinned.
    Never,
}

/// File-backed single-record store for the baseline.
///
/// Overwrite-on-accept: saving replaces the previous record, so at most one
/// baseline file exists at any time.
#[derive(Debug, Clone)]
pub struct BaselineStore {
    path: PathBuf,
}

impl BaselineStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the baseline, or `None` when no run has been accepted yet.
    pub fn load(&self) -> Result<Option<BaselineStats>, StageError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no baseline file, starting fresh");
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| StageError::data_with("cannot read baseline file", e))?;
        let stats = serde_json::from_str(&text)
            .map_err(|e| StageError::data_with("cannot parse baseline file", e))?;
        Ok(Some(stats))
    }

    /// Persist `stats` as the new baseline, replacing any previous record.
    pub fn save(&self, stats: &BaselineStats) -> Result<(), StageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StageError::data_with("cannot create baseline directory", e))?;
        }
        let text = serde_json::to_string_pretty(stats)
            .map_err(|e| StageError::data_with("cannot serialize baseline", e))?;
        std::fs::write(&self.path, text)
            .map_err(|e| StageError::data_with("cannot write baseline file", e))?;
        info!(path = %self.path.display(), "baseline saved");
        Ok(())
    }
}

/// Run-over-run drift detector.
#[derive(Debug, Clone)]
pub struct DriftDetector {
    threshold: f64,
}

impl Default for DriftDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_DRIFT_THRESHOLD,
        }
    }
}

impl DriftDetector {
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Compute the persistable statistics snapshot for a run.
    pub fn compute_stats(&self, summary: &DatasetSummary) -> BaselineStats {
        let roas_changes: Vec<f64> = summary
            .roas_drop_campaigns
            .iter()
            .map(|e| e.percent_change)
            .collect();
        let ctr_changes: Vec<f64> = summary
            .ctr_drop_campaigns
            .iter()
            .map(|e| e.percent_change)
            .collect();

        BaselineStats {
            run_timestamp: chrono::Utc::now().to_rfc3339(),
            campaign_count: summary.campaigns.len(),
            campaigns: summary.campaigns.clone(),
            roas_drop_count: summary.roas_drop_campaigns.len(),
            ctr_drop_count: summary.ctr_drop_campaigns.len(),
            avg_ctr: summary.overall_metrics.avg_ctr,
            avg_roas: summary.overall_metrics.avg_roas,
            total_spend: summary.overall_metrics.total_spend,
            total_revenue: summary.overall_metrics.total_revenue,
            roas_changes: SeriesStats::from_values(&roas_changes),
            ctr_changes: SeriesStats::from_values(&ctr_changes),
        }
    }

    /// Compare current stats against the baseline, if one exists.
    ///
    /// Without a baseline the report is empty with severity none; the
    /// caller is expected to persist the current stats as the first
    /// baseline. With one, every tracked dimension with both values present
    /// gets a detection; `has_drift` requires at least one dimension at or
    /// above the configured threshold.
    pub fn detect_drift(
        &self,
        current: &BaselineStats,
        baseline: Option<&BaselineStats>,
    ) -> DriftReport {
        let Some(baseline) = baseline else {
            return DriftReport::no_baseline();
        };

        let mut detections = Vec::new();
        let mut compare = |metric: &'static str, base: f64, cur: f64| {
            let drift = (cur - base).abs() / base.abs().max(EPSILON);
            detections.push(Detection {
                metric,
                baseline_value: base,
                current_value: cur,
                percent_drift: drift,
                severity: self.classify(drift),
            });
        };

        compare(
            "campaign_count",
            baseline.campaign_count as f64,
            current.campaign_count as f64,
        );
        compare(
            "roas_drop_count",
            baseline.roas_drop_count as f64,
            current.roas_drop_count as f64,
        );
        compare(
            "ctr_drop_count",
            baseline.ctr_drop_count as f64,
            current.ctr_drop_count as f64,
        );
        if let (Some(base), Some(cur)) = (&baseline.roas_changes, &current.roas_changes) {
            compare("roas_change_mean", base.mean, cur.mean);
        }
        if let (Some(base), Some(cur)) = (&baseline.ctr_changes, &current.ctr_changes) {
            compare("ctr_change_mean", base.mean, cur.mean);
        }

        let severity = detections
            .iter()
            .map(|d| d.severity)
            .max()
            .unwrap_or(DriftSeverity::None);
        let has_drift = detections
            .iter()
            .any(|d| d.severity >= DriftSeverity::Medium);

        DriftReport {
            has_drift,
            severity,
            detections,
        }
    }

    fn classify(&self, drift: f64) -> DriftSeverity {
        if drift >= HIGH_DRIFT {
            DriftSeverity::High
        } else if drift >= self.threshold {
            DriftSeverity::Medium
        } else if drift > 0.0 {
            DriftSeverity::Low
        } else {
            DriftSeverity::None
        }
    }
}
