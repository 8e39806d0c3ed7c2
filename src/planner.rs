//! Query decomposition into ordered analysis steps
//!
//! Thin by design: the plan is a list of step names the orchestrator logs
//! and follows. Complexity feeds back into the plan, so a hairy dataset gets
//! extra analysis steps and a trivial one gets a streamlined path.

use serde::Serialize;

use crate::complexity::{ComplexityAssessment, ComplexityBand};

/// An ordered analysis plan for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub steps: Vec<&'static str>,
    pub adaptation: String,
}

const BASE_STEPS: &[&str] = &[
    "load_and_summarize_data",
    "analyze_roas_trend",
    "identify_top_underperformers",
    "generate_hypotheses",
    "validate_hypotheses",
    "generate_creative_recommendations",
    "save_outputs",
];

/// Build the analysis plan from the user query and the complexity
/// assessment.
///
/// A query naming a metric family inserts a focus step; high complexity
/// adds anomaly and audience-overlap checks; low complexity drops the
/// trend step for a streamlined path.
pub fn plan(query: &str, complexity: &ComplexityAssessment) -> Plan {
    let mut steps: Vec<&'static str> = BASE_STEPS.to_vec();
    let lowered = query.to_lowercase();

    if lowered.contains("roas") {
        steps.insert(1, "focus_on_roas_time_series");
    } else if lowered.contains("ctr") {
        steps.insert(1, "focus_on_ctr_time_series");
    }

    let adaptation = match complexity.band {
        ComplexityBand::High => {
            let at = steps
                .iter()
                .position(|s| *s == "generate_hypotheses")
                .unwrap_or(steps.len());
            steps.insert(at, "detect_anomalies");
            steps.insert(at + 1, "check_audience_overlap");
            format!(
                "high complexity ({:.2}): added anomaly and audience-overlap steps",
                complexity.score
            )
        }
        ComplexityBand::Low => {
            steps.retain(|s| *s != "analyze_roas_trend");
            format!("low complexity ({:.2}): streamlined path", complexity.score)
        }
        ComplexityBand::Moderate => {
            format!("moderate complexity ({:.2}): standard path", complexity.score)
        }
    };

    Plan { steps, adaptation }
}
