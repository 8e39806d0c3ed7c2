//! Shared numeric kernel for the analysis pipeline
//!
//! Mean, population standard deviation, interpolated percentiles, and the
//! percent-change rule used everywhere a before/after pair is compared.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. Returns 0.0 for fewer than two values.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Percentile with classic linear interpolation between closest ranks.
///
/// `percentile` is in `[0, 100]`. Input does not need to be sorted.
pub fn percentile(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    percentile_sorted(&sorted, percentile)
}

/// Percentile over already-sorted data, avoiding a re-sort in hot loops.
pub fn percentile_sorted(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let index = (percentile / 100.0) * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] * (1.0 - weight) + sorted[upper] * weight
    }
}

/// Coefficient of variation, `std / |mean|`.
///
/// Returns `None` when the mean is exactly zero: dispersion relative to a
/// zero center is unbounded, and callers route that case to their
/// high-variance branch.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values);
    if m == 0.0 {
        return None;
    }
    Some(std_dev(values) / m.abs())
}

/// Fractional change from `previous` to `current`.
///
/// `(current - previous) / |previous|`, with the denominator's absolute
/// value preserving the sign of the move. Both-zero means no change; a zero
/// baseline makes the change undefined and yields `default`. When the pair
/// crosses from negative to positive the change is reported in magnitude
/// terms, `(|current| - |previous|) / |previous|`.
pub fn percent_change(current: f64, previous: f64, default: f64) -> f64 {
    if current == 0.0 && previous == 0.0 {
        return 0.0;
    }
    if previous == 0.0 {
        return default;
    }
    if previous < 0.0 && current > 0.0 {
        return (current.abs() - previous.abs()) / previous.abs();
    }
    (current - previous) / previous.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_basic() {
        assert!((mean(&[1.0, 2.0, 3.0, 4.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn std_dev_is_population() {
        // Population std of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn std_dev_single_value_is_zero() {
        assert_eq!(std_dev(&[42.0]), 0.0);
    }

    #[test]
    fn percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        // index = 0.25 * 3 = 0.75 -> between 1.0 and 2.0
        assert!((percentile(&values, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
    }

    #[test]
    fn percentile_unsorted_input() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn cv_none_when_mean_zero() {
        assert!(coefficient_of_variation(&[-1.0, 1.0]).is_none());
    }

    #[test]
    fn cv_scale_free() {
        let small = [1.0, 1.1, 0.9, 1.0];
        let large = [100.0, 110.0, 90.0, 100.0];
        let a = coefficient_of_variation(&small).unwrap();
        let b = coefficient_of_variation(&large).unwrap();
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn percent_change_basic() {
        assert!((percent_change(100.0, 50.0, 0.0) - 1.0).abs() < 1e-12);
        assert!((percent_change(50.0, 100.0, 0.0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn percent_change_zero_cases() {
        assert_eq!(percent_change(0.0, 0.0, 0.0), 0.0);
        assert_eq!(percent_change(100.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn percent_change_negative_baseline() {
        // Declines against a negative baseline keep sign semantics.
        assert!((percent_change(-2.0, -4.0, 0.0) - 0.5).abs() < 1e-12);
        // Crossing from negative to positive uses magnitudes.
        assert!((percent_change(2.0, -4.0, 0.0) + 0.5).abs() < 1e-12);
    }
}
