//! Creative recommendation payloads for CTR-decline campaigns
//!
//! Thin collaborator: it selects campaigns whose validated insights point at
//! engagement decline and emits schema-valid creative payloads. The copy is
//! generic placeholder text; real copywriting is out of scope here, but the
//! structure must survive the schema governor.

use serde::{Deserialize, Serialize};

use crate::evaluator::ValidationResult;
use crate::insight::SCHEMA_VERSION;

/// One creative recommendation set for a campaign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creative {
    pub campaign: String,
    pub issue: String,
    pub recommended_headlines: Vec<String>,
    pub recommended_messages: Vec<String>,
    pub cta: String,
    pub schema_version: String,
}

/// Build creative payloads from validated insights.
///
/// Selects CTR-performance insights (engagement decline is the case where a
/// creative refresh can plausibly help), at most `top_n`, in the validated
/// order. ROAS-only runs yield an empty list, which is valid output.
pub fn generate(validated: &[ValidationResult], top_n: usize) -> Vec<Creative> {
    validated
        .iter()
        .filter(|result| result.insight.analysis_type == "ctr_performance")
        .take(top_n)
        .map(|result| {
            let campaign = result.insight.evidence.campaign.clone();
            let drop_pct = result.insight.evidence.percent_change.abs() * 100.0;
            Creative {
                issue: format!("CTR declined {drop_pct:.1}% between periods"),
                recommended_headlines: vec![
                    format!("New angle for {campaign}: lead with a different benefit"),
                    format!("{campaign} refresh: new hook, same offer"),
                    format!("Rotate {campaign} creative to reset fatigue"),
                ],
                recommended_messages: vec![
                    "Swap the hero visual and rewrite the opening line; keep the offer intact."
                        .to_string(),
                    "Test a curiosity-first opener against the current proof-first variant."
                        .to_string(),
                ],
                cta: "Review creative rotation".to_string(),
                campaign,
                schema_version: SCHEMA_VERSION.to_string(),
            }
        })
        .collect()
}
