//! End-to-end pipeline scenarios: CSV in, governed JSON and Markdown out.

use std::path::{Path, PathBuf};

use adalyze::pipeline::{self, PipelineConfig};
use adalyze::schema::{PayloadKind, SchemaGovernor};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Ten campaigns over 28 days. C0 loses ~30% ROAS in the recent half;
/// the rest hold steady.
fn write_roas_drop_csv(dir: &Path) -> PathBuf {
    let mut out = String::from("date,campaign_name,spend,revenue,ctr,roas\n");
    for day in 1..=28 {
        let recent = day > 14;
        for campaign in 0..10 {
            let roas = if campaign == 0 {
                if recent {
                    2.8
                } else {
                    4.0
                }
            } else {
                2.0
            };
            out.push_str(&format!(
                "2025-06-{day:02},C{campaign},100,{},0.020,{roas}\n",
                roas * 100.0
            ));
        }
    }
    let path = dir.join("ads.csv");
    std::fs::write(&path, out).unwrap();
    path
}

/// Same shape, but C0 only slips 5%, under any adaptive threshold.
fn write_small_drop_csv(dir: &Path) -> PathBuf {
    let mut out = String::from("date,campaign_name,spend,revenue,ctr,roas\n");
    for day in 1..=28 {
        let recent = day > 14;
        for campaign in 0..10 {
            let roas = if campaign == 0 && recent { 3.8 } else if campaign == 0 { 4.0 } else { 2.0 };
            out.push_str(&format!(
                "2025-06-{day:02},C{campaign},100,{},0.020,{roas}\n",
                roas * 100.0
            ));
        }
    }
    let path = dir.join("ads.csv");
    std::fs::write(&path, out).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn clear_roas_drop_yields_one_high_confidence_insight() {
    let dir = TempDir::new().unwrap();
    let input = write_roas_drop_csv(dir.path());
    let config = PipelineConfig::new("Why did ROAS drop?", input, dir.path().join("out"));
    let outcome = pipeline::run(&config).unwrap();

    assert_eq!(outcome.insights.len(), 1);
    let insight = &outcome.insights[0];
    assert_eq!(insight.analysis_type, "roas_performance");
    assert_eq!(insight.evidence.campaign, "C0");
    assert!(insight.confidence >= 0.75);
    assert!(insight.hypothesis.contains("declined"));

    // The persisted payload carries the same insight and version stamp.
    let payload = read_json(&outcome.insights_path);
    assert_eq!(payload["schema_version"], "2.0");
    let list = payload["insights"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["confidence_level"], "high");
    assert_eq!(list[0]["evidence"]["campaign"], "C0");
}

#[test]
fn small_drop_produces_no_insights_but_a_complete_run() {
    let dir = TempDir::new().unwrap();
    let input = write_small_drop_csv(dir.path());
    let config = PipelineConfig::new("Why did ROAS drop?", input, dir.path().join("out"));
    let outcome = pipeline::run(&config).unwrap();

    assert!(outcome.insights.is_empty());
    assert!(outcome.outputs_valid);
    let payload = read_json(&outcome.insights_path);
    assert_eq!(payload["insights"].as_array().unwrap().len(), 0);
    let report = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert!(report.contains("No significant metric moves"));
}

#[test]
fn drift_flags_a_changed_dataset_on_the_second_run() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");

    let first = write_small_drop_csv(dir.path());
    let config = PipelineConfig::new("q", first, out.clone());
    pipeline::run(&config).unwrap();

    // Second run sees a very different dataset against the saved baseline.
    let second = write_roas_drop_csv(dir.path());
    let config = PipelineConfig::new("q", second, out);
    let outcome = pipeline::run(&config).unwrap();

    let drift = outcome.drift.unwrap();
    assert!(drift.has_drift);
    assert!(!drift.detections.is_empty());
}

#[test]
fn persisted_payloads_survive_independent_governance() {
    let dir = TempDir::new().unwrap();
    let input = write_roas_drop_csv(dir.path());
    let config = PipelineConfig::new("q", input, dir.path().join("out"));
    let outcome = pipeline::run(&config).unwrap();

    let governor = SchemaGovernor;
    let insights = read_json(&outcome.insights_path);
    assert!(governor.validate(&insights, PayloadKind::Insights).is_valid);
    let creatives = read_json(&outcome.creatives_path);
    assert!(governor.validate(&creatives, PayloadKind::Creatives).is_valid);
}

#[test]
fn legacy_payload_upgrades_before_validation() {
    // A v1 record on disk from an older run still passes governance after
    // the upgrade path renames and buckets its fields.
    let legacy = json!({
        "insights": [{
            "hypothesis": "ROAS declined for campaign C1",
            "evidence": {
                "campaign": "C1",
                "previous": 4.0,
                "current": 2.8,
                "percent_change": -0.30,
                "percentile_rank": 100.0
            },
            "expected_impact": "high",
            "confidence_estimate": 0.73
        }],
        "schema_version": "1.0"
    });

    let governor = SchemaGovernor;
    let upgraded = governor.upgrade(&legacy, PayloadKind::Insights);
    assert_eq!(upgraded["schema_version"], "2.0");
    let insight = &upgraded["insights"][0];
    assert_eq!(insight["confidence"], 0.73);
    assert_eq!(insight["confidence_level"], "moderate");
    assert!(insight.get("confidence_estimate").is_none());
    assert!(governor.validate(&upgraded, PayloadKind::Insights).is_valid);
}
