//! Statistical outlier removal over numeric series
//!
//! Used to clean percent-change series before threshold derivation, so a
//! single wild record cannot dominate the significance gate.

use crate::stats;

/// Outlier detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlierMethod {
    /// Keep values inside `[Q1 - k*IQR, Q3 + k*IQR]`
    Iqr,
    /// Keep values inside `[P10, P90]`
    Percentile,
}

/// Default IQR multiplier (Tukey's fences).
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Minimum series length for spread estimation; shorter series pass through.
const MIN_SAMPLES: usize = 4;

/// Remove outliers from `values`, returning the kept values in their
/// original order and the number removed.
///
/// Fewer than four values is too little to estimate spread reliably: the
/// input is returned unchanged with a removed count of zero. An all-equal
/// series collapses the IQR bounds to the single value, which is intended:
/// zero-variance data has no legitimate outliers and no tolerance band.
pub fn filter(
    values: &[f64],
    method: OutlierMethod,
    iqr_multiplier: f64,
) -> (Vec<f64>, usize) {
    if values.len() < MIN_SAMPLES {
        return (values.to_vec(), 0);
    }

    let (low, high) = match method {
        OutlierMethod::Iqr => {
            let q1 = stats::percentile(values, 25.0);
            let q3 = stats::percentile(values, 75.0);
            let iqr = q3 - q1;
            (q1 - iqr_multiplier * iqr, q3 + iqr_multiplier * iqr)
        }
        OutlierMethod::Percentile => (
            stats::percentile(values, 10.0),
            stats::percentile(values, 90.0),
        ),
    };

    let kept: Vec<f64> = values
        .iter()
        .copied()
        .filter(|v| *v >= low && *v <= high)
        .collect();
    let removed = values.len() - kept.len();
    (kept, removed)
}
