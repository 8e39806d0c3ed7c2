//! Hypothesis generation over the summary's drop lists
//!
//! For each metric family the engine cleans the percent-change series,
//! derives an adaptive significance threshold from what survived, and emits
//! one insight per drop entry that clears the threshold. Hypothesis text is
//! deliberately generic: metric, campaign identifier, and direction only,
//! never dataset-specific vocabulary.

use serde::{Deserialize, Serialize};

use crate::confidence::{self, ConfidenceLevel};
use crate::outliers::{self, OutlierMethod, DEFAULT_IQR_MULTIPLIER};
use crate::summary::{DatasetSummary, DropEntry};
use crate::threshold;

/// Current schema version stamped on every generated payload.
pub const SCHEMA_VERSION: &str = "2.0";

/// Metric families analyzed independently, ROAS before CTR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamily {
    Roas,
    Ctr,
}

impl MetricFamily {
    pub fn analysis_type(self) -> &'static str {
        match self {
            Self::Roas => "roas_performance",
            Self::Ctr => "ctr_performance",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Roas => "ROAS",
            Self::Ctr => "CTR",
        }
    }
}

/// Expected business impact bucket derived from change magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedImpact {
    Low,
    Moderate,
    High,
}

impl ExpectedImpact {
    fn from_change(change_pct: f64) -> Self {
        let magnitude = change_pct.abs();
        if magnitude >= 0.25 {
            Self::High
        } else if magnitude >= 0.15 {
            Self::Moderate
        } else {
            Self::Low
        }
    }
}

/// Numeric facts supporting one hypothesis. Owned by its insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub campaign: String,
    pub previous: f64,
    pub current: f64,
    pub percent_change: f64,
    /// Rank of this change's magnitude among its family peers, 0-100
    pub percentile_rank: f64,
}

impl Evidence {
    /// Number of distinct facts carried, fed into confidence scoring.
    pub const POINTS: usize = 5;
}

/// One evidence-backed hypothesis with bounded confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub hypothesis: String,
    pub evidence: Evidence,
    pub expected_impact: ExpectedImpact,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub analysis_type: String,
    pub schema_version: String,
}

/// Hypothesis generator over a dataset summary.
#[derive(Debug, Clone)]
pub struct InsightEngine {
    outlier_method: OutlierMethod,
    iqr_multiplier: f64,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self {
            outlier_method: OutlierMethod::Iqr,
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
        }
    }
}

impl InsightEngine {
    /// Generate insights for both metric families, ROAS family first,
    /// ordered by descending change magnitude within each family.
    ///
    /// Zero surviving entries for a family is silence, not an error.
    pub fn generate(&self, summary: &DatasetSummary) -> Vec<Insight> {
        let mut insights = Vec::new();
        insights.extend(self.analyze_family(MetricFamily::Roas, &summary.roas_drop_campaigns));
        insights.extend(self.analyze_family(MetricFamily::Ctr, &summary.ctr_drop_campaigns));
        insights
    }

    fn analyze_family(&self, family: MetricFamily, entries: &[DropEntry]) -> Vec<Insight> {
        if entries.is_empty() {
            return Vec::new();
        }

        let changes: Vec<f64> = entries.iter().map(|e| e.percent_change).collect();
        let (kept, removed) = outliers::filter(&changes, self.outlier_method, self.iqr_multiplier);
        let threshold = threshold::derive(&kept);
        let outliers_removed = removed > 0;

        let mut surviving: Vec<&DropEntry> = entries
            .iter()
            .filter(|e| e.percent_change.abs() > threshold)
            .collect();
        surviving.sort_by(|a, b| {
            b.percent_change
                .abs()
                .partial_cmp(&a.percent_change.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let magnitudes: Vec<f64> = changes.iter().map(|c| c.abs()).collect();
        surviving
            .into_iter()
            .map(|entry| self.build_insight(family, entry, threshold, outliers_removed, &magnitudes))
            .collect()
    }

    fn build_insight(
        &self,
        family: MetricFamily,
        entry: &DropEntry,
        threshold: f64,
        outliers_removed: bool,
        peer_magnitudes: &[f64],
    ) -> Insight {
        let magnitude = entry.percent_change.abs();
        let rank = percentile_rank(peer_magnitudes, magnitude);
        let direction = if entry.percent_change < 0.0 {
            "declined"
        } else {
            "increased"
        };

        let confidence = confidence::score(
            entry.percent_change,
            threshold,
            outliers_removed,
            Evidence::POINTS,
        );

        Insight {
            hypothesis: format!(
                "{} for campaign {} {} by {:.1}% between periods, exceeding the {:.0}% significance threshold",
                family.label(),
                entry.campaign,
                direction,
                magnitude * 100.0,
                threshold * 100.0,
            ),
            evidence: Evidence {
                campaign: entry.campaign.clone(),
                previous: entry.previous,
                current: entry.current,
                percent_change: entry.percent_change,
                percentile_rank: rank,
            },
            expected_impact: ExpectedImpact::from_change(entry.percent_change),
            confidence,
            confidence_level: ConfidenceLevel::from_score(confidence),
            analysis_type: family.analysis_type().to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }
}

/// Share of peer magnitudes at or below `value`, as a 0-100 rank.
fn percentile_rank(peers: &[f64], value: f64) -> f64 {
    if peers.is_empty() {
        return 0.0;
    }
    let at_or_below = peers.iter().filter(|p| **p <= value).count();
    at_or_below as f64 / peers.len() as f64 * 100.0
}
