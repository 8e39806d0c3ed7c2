//! Adaptive significance threshold derived from series dispersion
//!
//! The threshold is the minimum fractional change a metric move must exceed
//! to be hypothesis-worthy. Stable series earn a tight threshold, noisy
//! series a loose one, so the gate adapts to each dataset instead of using
//! one hardcoded cutoff.

use crate::stats;

/// Threshold for stable series (CV below 0.1): small moves are meaningful.
pub const STABLE_THRESHOLD: f64 = 0.08;
/// Threshold for moderately dispersed series (CV below 0.3).
pub const MODERATE_THRESHOLD: f64 = 0.10;
/// Threshold for noisy series: a bigger move is required to be credible.
pub const NOISY_THRESHOLD: f64 = 0.15;

const LOW_CV: f64 = 0.1;
const HIGH_CV: f64 = 0.3;

/// Derive the significance threshold for a percent-change series.
///
/// A mean of exactly zero makes the coefficient of variation unbounded; that
/// case is routed to the noisy-series threshold.
pub fn derive(values: &[f64]) -> f64 {
    match stats::coefficient_of_variation(values) {
        Some(cv) if cv < LOW_CV => STABLE_THRESHOLD,
        Some(cv) if cv < HIGH_CV => MODERATE_THRESHOLD,
        _ => NOISY_THRESHOLD,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_series_gets_tight_threshold() {
        // CV well under 0.1
        let values = [0.30, 0.31, 0.29, 0.30, 0.30];
        assert_eq!(derive(&values), STABLE_THRESHOLD);
    }

    #[test]
    fn moderate_series() {
        // Mean 1.0, population std 0.2 -> CV 0.2
        let values = [0.8, 1.2, 0.8, 1.2];
        assert_eq!(derive(&values), MODERATE_THRESHOLD);
    }

    #[test]
    fn noisy_series_gets_loose_threshold() {
        let values = [0.1, 1.0, 0.05, 2.0, 0.2];
        assert_eq!(derive(&values), NOISY_THRESHOLD);
    }

    #[test]
    fn zero_mean_routes_to_noisy() {
        let values = [-1.0, 1.0, -2.0, 2.0];
        assert_eq!(derive(&values), NOISY_THRESHOLD);
    }

    #[test]
    fn empty_series_routes_to_noisy() {
        assert_eq!(derive(&[]), NOISY_THRESHOLD);
    }
}
