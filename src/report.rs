//! Markdown report assembly
//!
//! Pure string assembly over the run's artifacts; no decision logic lives
//! here.

use crate::creative::Creative;
use crate::drift::{DriftReport, DriftSeverity};
use crate::evaluator::ValidationResult;
use crate::insight::Insight;
use crate::summary::DatasetSummary;

/// Render the run report as Markdown.
pub fn render(
    summary: &DatasetSummary,
    insights: &[Insight],
    validated: &[ValidationResult],
    creatives: &[Creative],
    drift: Option<&DriftReport>,
) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("# Advertising Performance Report".to_string());
    lines.push(String::new());
    lines.push(format!("**Date range:** {}", summary.date_range));
    lines.push(format!("**Campaigns:** {}", summary.campaigns.len()));
    lines.push(String::new());

    lines.push("## Overall Metrics".to_string());
    let metric = |name: &str, value: Option<f64>| match value {
        Some(v) => format!("- **{name}**: {v:.4}"),
        None => format!("- **{name}**: n/a"),
    };
    lines.push(metric("avg_ctr", summary.overall_metrics.avg_ctr));
    lines.push(metric("avg_roas", summary.overall_metrics.avg_roas));
    lines.push(metric("total_spend", summary.overall_metrics.total_spend));
    lines.push(metric("total_revenue", summary.overall_metrics.total_revenue));
    lines.push(String::new());

    lines.push("## Key Insights".to_string());
    if insights.is_empty() {
        lines.push("No significant metric moves detected this run.".to_string());
    }
    for insight in insights {
        lines.push(format!("- **Hypothesis:** {}", insight.hypothesis));
        lines.push(format!(
            "  - Confidence: {:.2} [{}]",
            insight.confidence,
            insight.confidence_level.as_str()
        ));
        lines.push(format!(
            "  - Evidence: campaign {} moved {:.4} -> {:.4} ({:+.1}%)",
            insight.evidence.campaign,
            insight.evidence.previous,
            insight.evidence.current,
            insight.evidence.percent_change * 100.0
        ));
    }
    lines.push(String::new());

    lines.push("## Validated Insights".to_string());
    for result in validated {
        lines.push(format!("- {}", result.insight.hypothesis));
        lines.push(format!(
            "  - Adjusted confidence: {:.2}{}",
            result.adjusted_confidence,
            if result.needs_review {
                " (flagged for review)"
            } else {
                ""
            }
        ));
        lines.push(format!("  - Notes: {}", result.validation_notes));
    }
    lines.push(String::new());

    lines.push("## Creative Recommendations".to_string());
    if creatives.is_empty() {
        lines.push("No creative changes recommended.".to_string());
    }
    for creative in creatives {
        lines.push(format!("- **Campaign:** {}", creative.campaign));
        lines.push(format!("  - Issue: {}", creative.issue));
        for headline in &creative.recommended_headlines {
            lines.push(format!("  - Headline: {headline}"));
        }
        lines.push(format!("  - CTA: {}", creative.cta));
    }
    lines.push(String::new());

    if let Some(drift) = drift {
        lines.push("## Drift".to_string());
        if !drift.has_drift {
            lines.push("No significant drift from baseline.".to_string());
        } else {
            lines.push(format!("Drift detected, severity: {:?}", drift.severity));
        }
        for detection in &drift.detections {
            if detection.severity >= DriftSeverity::Medium {
                lines.push(format!(
                    "- {}: {:.2} -> {:.2} ({:.1}% drift, {:?})",
                    detection.metric,
                    detection.baseline_value,
                    detection.current_value,
                    detection.percent_drift * 100.0,
                    detection.severity
                ));
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}
