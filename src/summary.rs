//! Dataset summary snapshot and the thin CSV loader that produces it
//!
//! The summary is created once per run and read-only afterwards; every
//! downstream stage consumes it without mutation. The loader is deliberately
//! thin I/O: it aggregates a daily campaign-metrics CSV into overall
//! aggregates and two drop lists, comparing a recent window against the
//! period before it.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StageError;
use crate::stats;

/// A metric decline for one campaign between two periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropEntry {
    pub campaign: String,
    pub previous: f64,
    pub current: f64,
    /// Fractional change, negative for a drop (e.g. -0.30 for a 30% decline)
    pub percent_change: f64,
}

/// Overall metric aggregates across the full date range.
///
/// Fields are optional because the source data may be missing columns; the
/// complexity scorer treats absent fields as added uncertainty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverallMetrics {
    pub avg_ctr: Option<f64>,
    pub avg_roas: Option<f64>,
    pub total_spend: Option<f64>,
    pub total_revenue: Option<f64>,
}

impl OverallMetrics {
    /// Number of expected overall-metric fields.
    pub const EXPECTED_FIELDS: usize = 4;

    /// Count of expected fields absent from this summary.
    pub fn missing_count(&self) -> usize {
        [
            self.avg_ctr.is_none(),
            self.avg_roas.is_none(),
            self.total_spend.is_none(),
            self.total_revenue.is_none(),
        ]
        .iter()
        .filter(|missing| **missing)
        .count()
    }
}

/// Immutable per-run snapshot of the dataset handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub date_range: String,
    pub campaigns: Vec<String>,
    pub overall_metrics: OverallMetrics,
    pub roas_drop_campaigns: Vec<DropEntry>,
    pub ctr_drop_campaigns: Vec<DropEntry>,
}

impl DatasetSummary {
    /// Structurally valid empty summary, used as the data-stage fallback.
    pub fn fallback() -> Self {
        Self {
            date_range: "N/A".to_string(),
            ..Self::default()
        }
    }
}

/// A decline must be worse than this fraction to count as a drop.
const DROP_CUTOFF: f64 = -0.10;

#[derive(Debug, Default, Clone)]
struct Row {
    date: NaiveDate,
    campaign: String,
    spend: Option<f64>,
    revenue: Option<f64>,
    ctr: Option<f64>,
    roas: Option<f64>,
}

/// Load a daily campaign-metrics CSV and summarize it.
///
/// Expected header columns: `date`, `campaign_name`, and any of `spend`,
/// `revenue`, `ctr`, `roas` (order-independent; missing metric columns leave
/// the corresponding aggregates absent). The drop lists compare per-campaign
/// means over the most recent `recent_days` against the equally sized period
/// before it.
pub fn from_csv(path: &Path, recent_days: i64) -> Result<DatasetSummary, StageError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| StageError::data_with(format!("cannot read {}", path.display()), e))?;
    from_csv_str(&text, recent_days)
}

fn from_csv_str(text: &str, recent_days: i64) -> Result<DatasetSummary, StageError> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| StageError::data("input CSV is empty"))?;
    let columns: Vec<&str> = header.split(',').map(str::trim).collect();

    let col = |name: &str| columns.iter().position(|c| c.eq_ignore_ascii_case(name));
    let date_col = col("date").ok_or_else(|| StageError::data("missing 'date' column"))?;
    let campaign_col =
        col("campaign_name").ok_or_else(|| StageError::data("missing 'campaign_name' column"))?;
    let spend_col = col("spend");
    let revenue_col = col("revenue");
    let ctr_col = col("ctr");
    let roas_col = col("roas");

    let mut rows = Vec::new();
    for (lineno, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let get = |idx: Option<usize>| -> Option<f64> {
            idx.and_then(|i| fields.get(i)).and_then(|f| f.parse().ok())
        };
        let raw_date = fields.get(date_col).copied().unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
            StageError::data_with(format!("bad date {raw_date:?} on row {}", lineno + 2), e)
        })?;
        let campaign = fields
            .get(campaign_col)
            .map(|c| c.to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| StageError::data(format!("empty campaign on row {}", lineno + 2)))?;

        rows.push(Row {
            date,
            campaign,
            spend: get(spend_col),
            revenue: get(revenue_col),
            ctr: get(ctr_col),
            roas: get(roas_col),
        });
    }

    if rows.is_empty() {
        return Err(StageError::data("input CSV has no data rows"));
    }

    summarize(&rows, recent_days)
}

fn summarize(rows: &[Row], recent_days: i64) -> Result<DatasetSummary, StageError> {
    let min_date = rows.iter().map(|r| r.date).min().expect("non-empty rows");
    let max_date = rows.iter().map(|r| r.date).max().expect("non-empty rows");
    let date_range = format!("{min_date} to {max_date}");

    // Campaign list in first-seen order.
    let mut campaigns: Vec<String> = Vec::new();
    for row in rows {
        if !campaigns.contains(&row.campaign) {
            campaigns.push(row.campaign.clone());
        }
    }

    let collect = |f: fn(&Row) -> Option<f64>| -> Vec<f64> { rows.iter().filter_map(f).collect() };
    let ctrs = collect(|r| r.ctr);
    let roases = collect(|r| r.roas);
    let spends = collect(|r| r.spend);
    let revenues = collect(|r| r.revenue);

    let overall_metrics = OverallMetrics {
        avg_ctr: (!ctrs.is_empty()).then(|| stats::mean(&ctrs)),
        avg_roas: (!roases.is_empty()).then(|| stats::mean(&roases)),
        total_spend: (!spends.is_empty()).then(|| spends.iter().sum()),
        total_revenue: (!revenues.is_empty()).then(|| revenues.iter().sum()),
    };

    // Window split: recent = last N days, previous = the N days before that.
    let recent_start = max_date - chrono::Duration::days(recent_days);
    let prev_start = max_date - chrono::Duration::days(recent_days * 2);

    let mut recent_by_campaign: BTreeMap<&str, Vec<&Row>> = BTreeMap::new();
    let mut prev_by_campaign: BTreeMap<&str, Vec<&Row>> = BTreeMap::new();
    for row in rows {
        if row.date > recent_start {
            recent_by_campaign.entry(&row.campaign).or_default().push(row);
        } else if row.date > prev_start {
            prev_by_campaign.entry(&row.campaign).or_default().push(row);
        }
    }

    let mut roas_drop_campaigns = Vec::new();
    let mut ctr_drop_campaigns = Vec::new();
    for campaign in &campaigns {
        let (Some(recent), Some(prev)) = (
            recent_by_campaign.get(campaign.as_str()),
            prev_by_campaign.get(campaign.as_str()),
        ) else {
            continue;
        };

        let window_mean = |rows: &[&Row], f: fn(&Row) -> Option<f64>| -> Option<f64> {
            let values: Vec<f64> = rows.iter().filter_map(|r| f(r)).collect();
            (!values.is_empty()).then(|| stats::mean(&values))
        };

        if let (Some(cur), Some(before)) =
            (window_mean(recent, |r| r.roas), window_mean(prev, |r| r.roas))
        {
            if before != 0.0 {
                let pct = stats::percent_change(cur, before, 0.0);
                if pct < DROP_CUTOFF {
                    roas_drop_campaigns.push(DropEntry {
                        campaign: campaign.clone(),
                        previous: before,
                        current: cur,
                        percent_change: pct,
                    });
                }
            }
        }
        if let (Some(cur), Some(before)) =
            (window_mean(recent, |r| r.ctr), window_mean(prev, |r| r.ctr))
        {
            if before != 0.0 {
                let pct = stats::percent_change(cur, before, 0.0);
                if pct < DROP_CUTOFF {
                    ctr_drop_campaigns.push(DropEntry {
                        campaign: campaign.clone(),
                        previous: before,
                        current: cur,
                        percent_change: pct,
                    });
                }
            }
        }
    }

    Ok(DatasetSummary {
        date_range,
        campaigns,
        overall_metrics,
        roas_drop_campaigns,
        ctr_drop_campaigns,
    })
}
