//! Bounded confidence scoring for generated hypotheses
//!
//! Confidence is a linear function of how far a change exceeds the adaptive
//! threshold, nudged by evidence quality, and always clamped to a fixed
//! band so no hypothesis is ever presented as certain or worthless.

use serde::{Deserialize, Serialize};

/// Floor of the confidence band.
pub const MIN_CONFIDENCE: f64 = 0.4;
/// Ceiling of the confidence band.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Cap on the combined outlier/evidence boost.
const MAX_BOOST: f64 = 0.10;
/// Boost applied when the signal survived outlier removal.
const OUTLIER_BOOST: f64 = 0.05;
/// Boost per evidence point beyond the first.
const EVIDENCE_BOOST: f64 = 0.02;

/// Discrete confidence bucket attached to every insight.
///
/// The bucket boundaries are a fixed contract: `>= 0.75` is high,
/// `>= 0.5` is moderate, anything below is low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Moderate,
    High,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Self::High
        } else if score >= 0.5 {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// Score confidence for a change against its significance threshold.
///
/// The base maps the exceedance ratio `(|change| - threshold) / threshold`
/// linearly onto `[MIN_CONFIDENCE, MAX_CONFIDENCE]`; a change at or below
/// the threshold clamps to the floor (callers are expected not to surface
/// sub-threshold changes at all). Boosts: +0.05 when outliers were removed
/// upstream, +0.02 per evidence point beyond the first, combined boost
/// capped at 0.10. The result is clamped to the band regardless of input.
pub fn score(
    change_pct: f64,
    threshold: f64,
    outliers_removed: bool,
    evidence_points: usize,
) -> f64 {
    let base = if threshold > 0.0 {
        let exceedance = (change_pct.abs() - threshold) / threshold;
        MIN_CONFIDENCE + exceedance.max(0.0) * (MAX_CONFIDENCE - MIN_CONFIDENCE)
    } else {
        MIN_CONFIDENCE
    };

    let mut boost = 0.0;
    if outliers_removed {
        boost += OUTLIER_BOOST;
    }
    boost += EVIDENCE_BOOST * evidence_points.saturating_sub(1) as f64;
    boost = boost.min(MAX_BOOST);

    (base.min(MAX_CONFIDENCE) + boost).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_threshold_clamps_to_floor() {
        let c = score(0.05, 0.10, false, 1);
        assert_eq!(c, MIN_CONFIDENCE);
    }

    #[test]
    fn large_exceedance_saturates_at_ceiling() {
        let c = score(10.0, 0.08, true, 50);
        assert_eq!(c, MAX_CONFIDENCE);
    }

    #[test]
    fn boost_is_capped() {
        // Base at floor; boost alone cannot exceed 0.10.
        let c = score(0.0, 0.10, true, 100);
        assert!((c - (MIN_CONFIDENCE + 0.10)).abs() < 1e-12);
    }

    #[test]
    fn outlier_removal_adds_five_points() {
        let without = score(0.0, 0.10, false, 1);
        let with = score(0.0, 0.10, true, 1);
        assert!((with - without - 0.05).abs() < 1e-12);
    }

    #[test]
    fn evidence_points_add_two_points_each() {
        let one = score(0.0, 0.10, false, 1);
        let three = score(0.0, 0.10, false, 3);
        assert!((three - one - 0.04).abs() < 1e-12);
    }

    #[test]
    fn linear_between_floor_and_ceiling() {
        // Exceedance 0.5 -> base 0.4 + 0.5 * 0.55 = 0.675
        let c = score(0.15, 0.10, false, 1);
        assert!((c - 0.675).abs() < 1e-12);
    }

    #[test]
    fn buckets_have_fixed_boundaries() {
        assert_eq!(ConfidenceLevel::from_score(0.75), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.7499), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_score(0.5), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_score(0.4999), ConfidenceLevel::Low);
    }

    #[test]
    fn negative_change_uses_magnitude() {
        let drop = score(-0.30, 0.08, false, 1);
        let rise = score(0.30, 0.08, false, 1);
        assert_eq!(drop, rise);
    }
}
