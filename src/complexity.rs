//! Dataset complexity scoring
//!
//! Derives a 0-1 complexity score from the summary so the planner can scale
//! analysis depth to the dataset: more campaigns, more missing aggregates,
//! and more detected drops all push the score up. Pure and deterministic:
//! the same summary always yields the same score and the same factor order.

use serde::Serialize;

use crate::summary::{DatasetSummary, OverallMetrics};

/// Reference campaign count at which the campaign factor saturates.
pub const DEFAULT_CAMPAIGN_REF: usize = 40;
/// Reference drop count at which the drop factor saturates.
pub const DEFAULT_DROP_REF: usize = 10;

const CAMPAIGN_WEIGHT: f64 = 0.3;
const MISSING_WEIGHT: f64 = 0.4;
const DROP_WEIGHT: f64 = 0.3;

/// Complexity band used by the planner to pick an analysis path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityBand {
    /// Score below 0.2: streamlined path
    Low,
    /// Everything in between
    Moderate,
    /// Score above 0.5: extra analysis steps warranted
    High,
}

/// One weighted factor with its contribution and rationale.
#[derive(Debug, Clone, Serialize)]
pub struct ComplexityFactor {
    pub name: &'static str,
    pub contribution: f64,
    pub rationale: String,
}

/// Derived complexity assessment, consumed by the planner and discarded.
#[derive(Debug, Clone, Serialize)]
pub struct ComplexityAssessment {
    /// Total score in [0, 1]
    pub score: f64,
    /// Factors in evaluation order
    pub factors: Vec<ComplexityFactor>,
    pub reasoning: String,
    pub band: ComplexityBand,
}

/// Complexity scorer with configurable saturation references.
#[derive(Debug, Clone)]
pub struct ComplexityScorer {
    campaign_ref: usize,
    drop_ref: usize,
}

impl Default for ComplexityScorer {
    fn default() -> Self {
        Self {
            campaign_ref: DEFAULT_CAMPAIGN_REF,
            drop_ref: DEFAULT_DROP_REF,
        }
    }
}

impl ComplexityScorer {
    pub fn new(campaign_ref: usize, drop_ref: usize) -> Self {
        Self {
            campaign_ref: campaign_ref.max(1),
            drop_ref: drop_ref.max(1),
        }
    }

    /// Score a dataset summary. No side effects; idempotent for equal input.
    pub fn score(&self, summary: &DatasetSummary) -> ComplexityAssessment {
        let mut factors = Vec::with_capacity(3);

        let campaign_count = summary.campaigns.len();
        let campaign_factor =
            (campaign_count as f64 / self.campaign_ref as f64 * CAMPAIGN_WEIGHT).min(CAMPAIGN_WEIGHT);
        factors.push(ComplexityFactor {
            name: "campaign_count",
            contribution: campaign_factor,
            rationale: format!(
                "{campaign_count} campaigns (saturates at {})",
                self.campaign_ref
            ),
        });

        let missing = summary.overall_metrics.missing_count();
        let missing_factor =
            missing as f64 / OverallMetrics::EXPECTED_FIELDS as f64 * MISSING_WEIGHT;
        factors.push(ComplexityFactor {
            name: "missing_metrics",
            contribution: missing_factor,
            rationale: format!(
                "{missing} of {} overall metrics absent; missing data widens required analysis depth",
                OverallMetrics::EXPECTED_FIELDS
            ),
        });

        let drops = summary.roas_drop_campaigns.len() + summary.ctr_drop_campaigns.len();
        let drop_factor = (drops as f64 / self.drop_ref as f64 * DROP_WEIGHT).min(DROP_WEIGHT);
        factors.push(ComplexityFactor {
            name: "performance_drops",
            contribution: drop_factor,
            rationale: format!("{drops} detected drops (saturates at {})", self.drop_ref),
        });

        let score = (campaign_factor + missing_factor + drop_factor).clamp(0.0, 1.0);
        let band = if score > 0.5 {
            ComplexityBand::High
        } else if score < 0.2 {
            ComplexityBand::Low
        } else {
            ComplexityBand::Moderate
        };

        let reasoning = factors
            .iter()
            .map(|f| format!("{}: {:.3} ({})", f.name, f.contribution, f.rationale))
            .collect::<Vec<_>>()
            .join("; ");

        ComplexityAssessment {
            score,
            factors,
            reasoning,
            band,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::DropEntry;

    fn drop_entry(campaign: &str, pct: f64) -> DropEntry {
        DropEntry {
            campaign: campaign.to_string(),
            previous: 1.0,
            current: 1.0 + pct,
            percent_change: pct,
        }
    }

    fn full_metrics() -> OverallMetrics {
        OverallMetrics {
            avg_ctr: Some(0.02),
            avg_roas: Some(2.0),
            total_spend: Some(1000.0),
            total_revenue: Some(2000.0),
        }
    }

    #[test]
    fn empty_summary_scores_low() {
        let summary = DatasetSummary {
            overall_metrics: full_metrics(),
            ..DatasetSummary::fallback()
        };
        let assessment = ComplexityScorer::default().score(&summary);
        assert_eq!(assessment.score, 0.0);
        assert_eq!(assessment.band, ComplexityBand::Low);
    }

    #[test]
    fn factors_are_in_fixed_order() {
        let summary = DatasetSummary::fallback();
        let assessment = ComplexityScorer::default().score(&summary);
        let names: Vec<&str> = assessment.factors.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec!["campaign_count", "missing_metrics", "performance_drops"]
        );
    }

    #[test]
    fn each_factor_is_clamped_to_its_weight() {
        let summary = DatasetSummary {
            campaigns: (0..500).map(|i| format!("C{i}")).collect(),
            roas_drop_campaigns: (0..50).map(|i| drop_entry(&format!("C{i}"), -0.3)).collect(),
            ..DatasetSummary::fallback()
        };
        let assessment = ComplexityScorer::default().score(&summary);
        assert!((assessment.factors[0].contribution - 0.3).abs() < 1e-12);
        assert!((assessment.factors[1].contribution - 0.4).abs() < 1e-12);
        assert!((assessment.factors[2].contribution - 0.3).abs() < 1e-12);
        assert_eq!(assessment.score, 1.0);
        assert_eq!(assessment.band, ComplexityBand::High);
    }

    #[test]
    fn missing_metrics_scale_linearly() {
        let summary = DatasetSummary {
            overall_metrics: OverallMetrics {
                avg_ctr: Some(0.02),
                avg_roas: Some(2.0),
                ..OverallMetrics::default()
            },
            ..DatasetSummary::fallback()
        };
        let assessment = ComplexityScorer::default().score(&summary);
        assert!((assessment.factors[1].contribution - 0.2).abs() < 1e-12);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let summary = DatasetSummary {
            campaigns: vec!["A".into(), "B".into()],
            overall_metrics: full_metrics(),
            ctr_drop_campaigns: vec![drop_entry("A", -0.2)],
            ..DatasetSummary::fallback()
        };
        let scorer = ComplexityScorer::default();
        let a = scorer.score(&summary);
        let b = scorer.score(&summary);
        assert_eq!(a.score, b.score);
        assert_eq!(a.reasoning, b.reasoning);
    }

    #[test]
    fn moderate_band_between_cutoffs() {
        // 10 campaigns -> 0.075, two metrics missing -> 0.2, one drop -> 0.03
        let summary = DatasetSummary {
            campaigns: (0..10).map(|i| format!("C{i}")).collect(),
            overall_metrics: OverallMetrics {
                avg_ctr: Some(0.02),
                avg_roas: Some(2.0),
                ..OverallMetrics::default()
            },
            roas_drop_campaigns: vec![drop_entry("C0", -0.3)],
            ..DatasetSummary::fallback()
        };
        let assessment = ComplexityScorer::default().score(&summary);
        assert!(assessment.score > 0.2 && assessment.score < 0.5);
        assert_eq!(assessment.band, ComplexityBand::Moderate);
    }
}
