//! Independent re-validation of generated insights
//!
//! The evaluator re-derives its checks from the raw summary rather than the
//! insight's own evidence, so an inconsistency between the two surfaces as a
//! confidence penalty instead of passing silently. Adjustments are an
//! ordered rule table: every triggered rule applies, the order is fixed, and
//! the result is additive and order-independent.

use serde::Serialize;

use crate::confidence::ConfidenceLevel;
use crate::insight::Insight;
use crate::summary::DatasetSummary;

/// Thresholds for the aggregate recheck and the review flag.
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// An average ROAS below this supports a ROAS-decline hypothesis
    pub low_roas_threshold: f64,
    /// An average CTR below this supports a CTR-decline hypothesis
    pub low_ctr_threshold: f64,
    /// Results under this adjusted confidence are flagged for review
    pub review_cutoff: f64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            low_roas_threshold: 2.0,
            low_ctr_threshold: 0.015,
            review_cutoff: 0.6,
        }
    }
}

/// Outcome of re-validating one insight. 1:1 with its input.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub insight: Insight,
    pub adjusted_confidence: f64,
    pub validation_notes: String,
    /// Set when adjusted confidence fell under the review cutoff; the
    /// evaluator only reports the flag, retrying is the caller's decision.
    pub needs_review: bool,
}

/// How the independent aggregate recheck came out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recheck {
    Supports,
    Contradicts,
    Inconclusive,
}

struct Rule {
    name: &'static str,
    adjustment: f64,
    applies: fn(&Insight, Recheck) -> bool,
}

/// Fixed rule table, evaluated in order; all triggered rules apply.
const RULES: &[Rule] = &[
    Rule {
        name: "large_change",
        adjustment: 0.2,
        applies: |insight, _| insight.evidence.percent_change.abs() > 0.20,
    },
    Rule {
        name: "moderate_change",
        adjustment: 0.1,
        applies: |insight, _| {
            let magnitude = insight.evidence.percent_change.abs();
            (0.10..=0.20).contains(&magnitude)
        },
    },
    Rule {
        name: "aggregate_recheck_failed",
        adjustment: -0.1,
        applies: |_, recheck| recheck != Recheck::Supports,
    },
];

/// Statistical re-validator for generated insights.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    /// Re-score each insight against the raw summary.
    pub fn validate(&self, insights: &[Insight], summary: &DatasetSummary) -> Vec<ValidationResult> {
        insights
            .iter()
            .map(|insight| self.validate_one(insight, summary))
            .collect()
    }

    fn validate_one(&self, insight: &Insight, summary: &DatasetSummary) -> ValidationResult {
        let recheck = self.recheck_aggregate(insight, summary);

        let mut fired = Vec::new();
        let mut adjustment = 0.0;
        for rule in RULES {
            if (rule.applies)(insight, recheck) {
                fired.push(rule.name);
                adjustment += rule.adjustment;
            }
        }

        let adjusted = (insight.confidence + adjustment).clamp(0.0, 1.0);
        let validation_notes = if fired.is_empty() {
            "no adjustment rules fired".to_string()
        } else {
            fired.join(" | ")
        };

        // The one permitted confidence mutation: the validated insight
        // carries the adjusted score and its re-derived bucket.
        let mut insight = insight.clone();
        insight.confidence = adjusted;
        insight.confidence_level = ConfidenceLevel::from_score(adjusted);

        ValidationResult {
            insight,
            adjusted_confidence: adjusted,
            validation_notes,
            needs_review: adjusted < self.config.review_cutoff,
        }
    }

    fn recheck_aggregate(&self, insight: &Insight, summary: &DatasetSummary) -> Recheck {
        let (aggregate, low_threshold) = match insight.analysis_type.as_str() {
            "roas_performance" => (
                summary.overall_metrics.avg_roas,
                self.config.low_roas_threshold,
            ),
            "ctr_performance" => (
                summary.overall_metrics.avg_ctr,
                self.config.low_ctr_threshold,
            ),
            _ => return Recheck::Inconclusive,
        };
        match aggregate {
            Some(value) if value < low_threshold => Recheck::Supports,
            Some(_) => Recheck::Contradicts,
            None => Recheck::Inconclusive,
        }
    }
}
