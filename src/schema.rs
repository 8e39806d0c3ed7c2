//! Schema governance for persisted payloads
//!
//! Persisted insight and creative payloads carry a schema version tag; the
//! governor validates them exhaustively against the v2.0 required-field sets
//! and upgrades legacy v1.0 payloads through a pure, deterministic,
//! idempotent transform. Validation collects every violation rather than
//! failing on the first, so a caller sees the whole repair surface at once.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::confidence::ConfidenceLevel;
use crate::insight::SCHEMA_VERSION;

/// Which payload family a value is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Insights,
    Creatives,
}

impl PayloadKind {
    /// Name of the top-level array field for this kind.
    fn array_field(self) -> &'static str {
        match self {
            Self::Insights => "insights",
            Self::Creatives => "creatives",
        }
    }
}

/// One schema violation with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaViolation {
    pub field_path: String,
    pub message: String,
}

/// Exhaustive validation outcome.
#[derive(Debug, Clone)]
pub struct SchemaReport {
    pub is_valid: bool,
    pub violations: Vec<SchemaViolation>,
}

/// Validator and upgrader for versioned output payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaGovernor;

impl SchemaGovernor {
    /// Validate `payload` against the v2.0 schema for `kind`.
    pub fn validate(&self, payload: &Value, kind: PayloadKind) -> SchemaReport {
        let mut violations = Vec::new();

        let Some(root) = payload.as_object() else {
            violations.push(violation("$", "root must be an object"));
            return SchemaReport {
                is_valid: false,
                violations,
            };
        };

        check_version(root, "schema_version", &mut violations);

        let field = kind.array_field();
        match root.get(field) {
            None => violations.push(violation(field, "missing required field")),
            Some(Value::Array(items)) => {
                for (idx, item) in items.iter().enumerate() {
                    let path = format!("{field}[{idx}]");
                    match kind {
                        PayloadKind::Insights => validate_insight(item, &path, &mut violations),
                        PayloadKind::Creatives => validate_creative(item, &path, &mut violations),
                    }
                }
            }
            Some(_) => violations.push(violation(field, "must be an array")),
        }

        SchemaReport {
            is_valid: violations.is_empty(),
            violations,
        }
    }

    /// Upgrade a payload to v2.0. Already-v2.0 payloads pass through
    /// unchanged, which makes the transform idempotent.
    pub fn upgrade(&self, payload: &Value, kind: PayloadKind) -> Value {
        if payload.get("schema_version").and_then(Value::as_str) == Some(SCHEMA_VERSION) {
            return payload.clone();
        }
        match kind {
            PayloadKind::Insights => upgrade_insights(payload),
            PayloadKind::Creatives => upgrade_creatives(payload),
        }
    }
}

fn violation(field_path: impl Into<String>, message: impl Into<String>) -> SchemaViolation {
    SchemaViolation {
        field_path: field_path.into(),
        message: message.into(),
    }
}

fn check_version(obj: &Map<String, Value>, path: &str, violations: &mut Vec<SchemaViolation>) {
    match obj.get("schema_version") {
        None => violations.push(violation(path, "missing required field")),
        Some(Value::String(v)) if v == SCHEMA_VERSION => {}
        Some(other) => violations.push(violation(
            path,
            format!("expected \"{SCHEMA_VERSION}\", got {other}"),
        )),
    }
}

fn validate_insight(item: &Value, path: &str, violations: &mut Vec<SchemaViolation>) {
    let Some(obj) = item.as_object() else {
        violations.push(violation(path, "must be an object"));
        return;
    };

    match obj.get("hypothesis") {
        None => violations.push(violation(format!("{path}.hypothesis"), "missing required field")),
        Some(Value::String(s)) if !s.is_empty() => {}
        Some(Value::String(_)) => {
            violations.push(violation(format!("{path}.hypothesis"), "must not be empty"));
        }
        Some(_) => violations.push(violation(format!("{path}.hypothesis"), "must be a string")),
    }

    match obj.get("evidence") {
        None => violations.push(violation(format!("{path}.evidence"), "missing required field")),
        Some(Value::Object(_)) => {}
        Some(_) => violations.push(violation(format!("{path}.evidence"), "must be an object")),
    }

    match obj.get("confidence") {
        None => violations.push(violation(format!("{path}.confidence"), "missing required field")),
        Some(value) => match value.as_f64() {
            Some(v) if (0.0..=1.0).contains(&v) => {}
            Some(v) => violations.push(violation(
                format!("{path}.confidence"),
                format!("must be within [0, 1], got {v}"),
            )),
            None => violations.push(violation(format!("{path}.confidence"), "must be a number")),
        },
    }

    match obj.get("schema_version") {
        None => violations.push(violation(
            format!("{path}.schema_version"),
            "missing required field",
        )),
        Some(Value::String(v)) if v == SCHEMA_VERSION => {}
        Some(other) => violations.push(violation(
            format!("{path}.schema_version"),
            format!("expected \"{SCHEMA_VERSION}\", got {other}"),
        )),
    }

    // Optional fields are validated only when present.
    if let Some(level) = obj.get("confidence_level") {
        match level.as_str() {
            Some("low" | "moderate" | "high") => {}
            _ => violations.push(violation(
                format!("{path}.confidence_level"),
                "must be one of low, moderate, high",
            )),
        }
    }
    for optional in ["analysis_type", "expected_impact"] {
        if let Some(value) = obj.get(optional) {
            if !value.is_string() {
                violations.push(violation(format!("{path}.{optional}"), "must be a string"));
            }
        }
    }
}

fn validate_creative(item: &Value, path: &str, violations: &mut Vec<SchemaViolation>) {
    let Some(obj) = item.as_object() else {
        violations.push(violation(path, "must be an object"));
        return;
    };

    for required in ["campaign", "issue", "cta"] {
        match obj.get(required) {
            None => violations.push(violation(
                format!("{path}.{required}"),
                "missing required field",
            )),
            Some(Value::String(_)) => {}
            Some(_) => violations.push(violation(format!("{path}.{required}"), "must be a string")),
        }
    }

    match obj.get("recommended_headlines") {
        None => violations.push(violation(
            format!("{path}.recommended_headlines"),
            "missing required field",
        )),
        Some(Value::Array(items)) if items.is_empty() => violations.push(violation(
            format!("{path}.recommended_headlines"),
            "must not be empty",
        )),
        Some(Value::Array(items)) => {
            for (idx, headline) in items.iter().enumerate() {
                if !headline.is_string() {
                    violations.push(violation(
                        format!("{path}.recommended_headlines[{idx}]"),
                        "must be a string",
                    ));
                }
            }
        }
        Some(_) => violations.push(violation(
            format!("{path}.recommended_headlines"),
            "must be an array",
        )),
    }

    match obj.get("schema_version") {
        None => violations.push(violation(
            format!("{path}.schema_version"),
            "missing required field",
        )),
        Some(Value::String(v)) if v == SCHEMA_VERSION => {}
        Some(other) => violations.push(violation(
            format!("{path}.schema_version"),
            format!("expected \"{SCHEMA_VERSION}\", got {other}"),
        )),
    }
}

/// v1.0 insights used `confidence_estimate`; the upgrade renames it,
/// coerces to a number clamped into [0, 1], and derives the level bucket.
fn upgrade_insights(payload: &Value) -> Value {
    let items = payload
        .get("insights")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let upgraded: Vec<Value> = items
        .iter()
        .map(|item| {
            let confidence = coerce_confidence(item);
            json!({
                "hypothesis": item.get("hypothesis").cloned().unwrap_or_else(|| json!("")),
                "evidence": item.get("evidence").cloned().unwrap_or_else(|| json!({})),
                "expected_impact": item
                    .get("expected_impact")
                    .cloned()
                    .unwrap_or_else(|| json!("unknown")),
                "confidence": confidence,
                "confidence_level": ConfidenceLevel::from_score(confidence).as_str(),
                "analysis_type": item
                    .get("analysis_type")
                    .cloned()
                    .unwrap_or_else(|| json!("legacy_v1_conversion")),
                "schema_version": SCHEMA_VERSION,
            })
        })
        .collect();

    json!({ "insights": upgraded, "schema_version": SCHEMA_VERSION })
}

fn coerce_confidence(item: &Value) -> f64 {
    let raw = item
        .get("confidence_estimate")
        .or_else(|| item.get("confidence"));
    match raw.and_then(Value::as_f64) {
        Some(v) if (0.0..=1.0).contains(&v) => v,
        Some(v) => {
            warn!(value = v, "v1 confidence out of range, clamping into [0, 1]");
            v.clamp(0.0, 1.0)
        }
        None => {
            warn!("v1 confidence missing or non-numeric, defaulting to 0.5");
            0.5
        }
    }
}

fn upgrade_creatives(payload: &Value) -> Value {
    let items = payload
        .get("creatives")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let upgraded: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "campaign": item.get("campaign").cloned().unwrap_or_else(|| json!("")),
                "issue": item.get("issue").cloned().unwrap_or_else(|| json!("unknown")),
                "recommended_headlines": item
                    .get("recommended_headlines")
                    .cloned()
                    .unwrap_or_else(|| json!([])),
                "recommended_messages": item
                    .get("recommended_messages")
                    .cloned()
                    .unwrap_or_else(|| json!([])),
                "cta": item.get("cta").cloned().unwrap_or_else(|| json!("")),
                "schema_version": SCHEMA_VERSION,
            })
        })
        .collect();

    json!({ "creatives": upgraded, "schema_version": SCHEMA_VERSION })
}
