//! Sigma estimators shared by the capability calculator and the control-limit
//! engine.
//!
//! Both analyses must use the same within-subgroup sigma; otherwise Cp/Cpk and
//! the control chart disagree about the same process. Everything that needs a
//! within sigma goes through [`within_sigma`].
//!
//! # Estimators
//!
//! | Mode | Estimator |
//! |------|-----------|
//! | individuals (`n = 1`) | MR-bar / 1.128 (moving range of 2) |
//! | subgroups (`n = 2..=10`) | R-bar / d2(n) |
//! | overall | population standard deviation (divide by N) |
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

use u_numflow::stats;

use crate::series::MeasurementSeries;

/// d2 factors (mean of the range distribution), indexed by subgroup size n=2..10.
///
/// sigma-hat = R-bar / d2. Index 0 corresponds to n=2.
const D2: [f64; 9] = [1.128, 1.693, 2.059, 2.326, 2.534, 2.704, 2.847, 2.970, 3.078];

/// d2 for a moving range of two consecutive individuals.
pub const D2_MOVING_RANGE: f64 = 1.128;

/// Returns the d2 constant for a subgroup size in `2..=10`.
pub fn d2(subgroup_size: usize) -> Option<f64> {
    subgroup_size
        .checked_sub(2)
        .and_then(|idx| D2.get(idx))
        .copied()
}

/// Moving-range sigma estimate: `avg(|x_i - x_{i-1}|) / 1.128`.
///
/// `None` for fewer than two values.
pub fn moving_range_sigma(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let ranges: Vec<f64> = values.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let mr_bar = stats::mean(&ranges)?;
    Some(mr_bar / D2_MOVING_RANGE)
}

/// Within-subgroup sigma for the series' own subgroup size.
///
/// Returns `None` when there is not enough data: fewer than two samples in
/// individual mode, or no complete subgroup otherwise. A zero estimate is
/// returned as `Some(0.0)`; callers decide how to flag it.
pub fn within_sigma(series: &MeasurementSeries) -> Option<f64> {
    let n = series.subgroup_size();
    if n == 1 {
        return moving_range_sigma(series.values());
    }
    let d2 = d2(n)?;
    let ranges: Vec<f64> = series.subgroups().iter().map(|g| g.range).collect();
    let r_bar = stats::mean(&ranges)?;
    Some(r_bar / d2)
}

/// Population standard deviation (divide by N).
///
/// `None` for fewer than two values. A series of identical values yields
/// exactly `0.0`.
pub fn overall_sigma(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    if values.iter().all(|&v| v == values[0]) {
        return Some(0.0);
    }
    stats::population_std_dev(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_d2_table_bounds() {
        assert_eq!(d2(1), None);
        assert_eq!(d2(2), Some(1.128));
        assert_eq!(d2(5), Some(2.326));
        assert_eq!(d2(10), Some(3.078));
        assert_eq!(d2(11), None);
    }

    #[test]
    fn test_moving_range_sigma() {
        // MR = 2, 3 → MR-bar = 2.5
        let sigma = moving_range_sigma(&[10.0, 12.0, 9.0]).unwrap();
        assert!((sigma - 2.5 / 1.128).abs() < 1e-12);
        assert!(moving_range_sigma(&[1.0]).is_none());
    }

    #[test]
    fn test_within_sigma_subgrouped() {
        // Subgroups [45,47,50,53,55] → R=10; [49,50,50,51,50] → R=2; R-bar = 6
        let series = MeasurementSeries::from_values(&[
            45.0, 47.0, 50.0, 53.0, 55.0, 49.0, 50.0, 50.0, 51.0, 50.0,
        ])
        .unwrap()
        .with_subgroup_size(5)
        .unwrap();
        let sigma = within_sigma(&series).unwrap();
        assert!((sigma - 6.0 / 2.326).abs() < 1e-12);
    }

    #[test]
    fn test_within_sigma_needs_complete_subgroup() {
        let series = MeasurementSeries::from_values(&[1.0, 2.0, 3.0])
            .unwrap()
            .with_subgroup_size(4)
            .unwrap();
        assert!(within_sigma(&series).is_none());
    }

    #[test]
    fn test_overall_sigma_is_population() {
        // Population variance of [2,4,4,4,5,5,7,9] is 4 → sigma 2
        let sigma = overall_sigma(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sigma - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_overall_sigma_divides_by_n() {
        // Squared deviations 2.25, 0.25, 0.25, 2.25 over N = 4
        let sigma = overall_sigma(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((sigma - 1.25_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_overall_sigma_constant_is_exact_zero() {
        assert_eq!(overall_sigma(&[1.2; 20]), Some(0.0));
        assert!(overall_sigma(&[1.2]).is_none());
    }
}
