//! Control limits and zone classification for a measurement series.
//!
//! The chart uses the same within-subgroup sigma as the capability
//! calculator ([`within_sigma`]): MR-bar/1.128 for individuals, R-bar/d2
//! for subgroups. The center line is the grand mean in individual mode and
//! the mean of complete subgroup means otherwise.
//!
//! Every individual sample is standardized against that center line and
//! sigma, so the run rules always see one z-score per sample. Subgrouped
//! series additionally report classical X-bar and R chart limits.
//!
//! Factor tables (A2, D3, D4) are from ASTM E2587 / Montgomery Appendix VI.

use u_numflow::stats;

use super::chart::{ChartLimits, ControlLimits, Side, StandardizedPoint, SubgroupLimits, Zone};
use crate::capability::within_sigma;
use crate::error::Unavailable;
use crate::series::MeasurementSeries;

/// A2 factors for the X-bar chart, indexed by subgroup size n=2..10.
const A2: [f64; 9] = [1.880, 1.023, 0.729, 0.577, 0.483, 0.419, 0.373, 0.337, 0.308];

/// D3 factors for the R chart lower limit, n=2..10.
const D3: [f64; 9] = [0.0, 0.0, 0.0, 0.0, 0.0, 0.076, 0.136, 0.184, 0.223];

/// D4 factors for the R chart upper limit, n=2..10.
const D4: [f64; 9] = [3.267, 2.575, 2.282, 2.114, 2.004, 1.924, 1.864, 1.816, 1.777];

/// Control limits plus the standardized points of one series snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneAnalysis {
    pub limits: ControlLimits,
    pub points: Vec<StandardizedPoint>,
    /// X-bar and R chart limits; `None` in individual mode.
    pub subgroup: Option<SubgroupLimits>,
}

impl ZoneAnalysis {
    /// Computes limits and standardizes every sample.
    ///
    /// # Errors
    ///
    /// - [`Unavailable::InsufficientData`] with fewer than two samples, or no
    ///   complete subgroup
    /// - [`Unavailable::ZeroVariance`] when the within sigma is exactly zero
    ///
    /// # Examples
    ///
    /// ```
    /// use spc_core::series::MeasurementSeries;
    /// use spc_core::spc::ZoneAnalysis;
    ///
    /// let series = MeasurementSeries::from_values(&[10.0, 12.0, 11.0, 13.0]).unwrap();
    /// let zones = ZoneAnalysis::from_series(&series).unwrap();
    /// assert!((zones.limits.center_line - 11.5).abs() < 1e-12);
    /// assert_eq!(zones.points.len(), 4);
    /// ```
    pub fn from_series(series: &MeasurementSeries) -> Result<Self, Unavailable> {
        let limits = control_limits(series)?;
        let points = series
            .samples()
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                let z = limits.standardize(sample.value);
                StandardizedPoint {
                    index,
                    timestamp: sample.timestamp,
                    value: sample.value,
                    z,
                    zone: Zone::of(z),
                    side: Side::of(z),
                }
            })
            .collect();
        Ok(Self {
            limits,
            points,
            subgroup: subgroup_limits(series),
        })
    }

    /// Standardized values in series order.
    pub fn z_scores(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.z).collect()
    }

    /// Number of points in each zone, as `(C, B, A, beyond)`.
    pub fn zone_counts(&self) -> (usize, usize, usize, usize) {
        self.points
            .iter()
            .fold((0, 0, 0, 0), |(c, b, a, x), p| match p.zone {
                Zone::C => (c + 1, b, a, x),
                Zone::B => (c, b + 1, a, x),
                Zone::A => (c, b, a + 1, x),
                Zone::Beyond => (c, b, a, x + 1),
            })
    }
}

/// Computes control limits for a series without standardizing its points.
///
/// # Errors
///
/// Same as [`ZoneAnalysis::from_series`].
pub fn control_limits(series: &MeasurementSeries) -> Result<ControlLimits, Unavailable> {
    let sigma = within_sigma(series).ok_or(Unavailable::InsufficientData)?;
    if sigma == 0.0 {
        return Err(Unavailable::ZeroVariance);
    }
    let center_line = if series.subgroup_size() == 1 {
        stats::mean(series.values())
    } else {
        let means: Vec<f64> = series.subgroups().iter().map(|g| g.mean).collect();
        stats::mean(&means)
    }
    .ok_or(Unavailable::InsufficientData)?;
    Ok(ControlLimits::from_center(center_line, sigma))
}

/// X-bar and R chart limits for a subgrouped series.
///
/// `None` in individual mode or when there is no complete subgroup.
///
/// # Examples
///
/// ```
/// use spc_core::series::MeasurementSeries;
/// use spc_core::spc::subgroup_limits;
///
/// let series = MeasurementSeries::from_values(&[9.0, 11.0, 10.0, 12.0])
///     .unwrap()
///     .with_subgroup_size(2)
///     .unwrap();
/// let limits = subgroup_limits(&series).unwrap();
/// // X-double-bar = 10.5, R-bar = 2, A2(2) = 1.880
/// assert!((limits.x_bar.ucl - (10.5 + 1.880 * 2.0)).abs() < 1e-12);
/// assert!((limits.range.ucl - 3.267 * 2.0).abs() < 1e-12);
/// ```
pub fn subgroup_limits(series: &MeasurementSeries) -> Option<SubgroupLimits> {
    let n = series.subgroup_size();
    let idx = n.checked_sub(2)?;
    let (a2, d3, d4) = (*A2.get(idx)?, *D3.get(idx)?, *D4.get(idx)?);

    let groups = series.subgroups();
    let means: Vec<f64> = groups.iter().map(|g| g.mean).collect();
    let ranges: Vec<f64> = groups.iter().map(|g| g.range).collect();
    let grand_mean = stats::mean(&means)?;
    let r_bar = stats::mean(&ranges)?;

    Some(SubgroupLimits {
        subgroup_size: n,
        x_bar: ChartLimits {
            center_line: grand_mean,
            ucl: grand_mean + a2 * r_bar,
            lcl: grand_mean - a2 * r_bar,
        },
        range: ChartLimits {
            center_line: r_bar,
            ucl: d4 * r_bar,
            lcl: d3 * r_bar,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_individuals_limits() {
        // MR = 2, 1, 2 → MR-bar = 5/3
        let series = MeasurementSeries::from_values(&[10.0, 12.0, 11.0, 13.0]).unwrap();
        let limits = control_limits(&series).unwrap();
        let sigma = (5.0 / 3.0) / 1.128;
        assert_abs_diff_eq!(limits.sigma, sigma, epsilon = 1e-12);
        assert_abs_diff_eq!(limits.ucl, 11.5 + 3.0 * sigma, epsilon = 1e-12);
        assert_abs_diff_eq!(limits.lcl, 11.5 - 3.0 * sigma, epsilon = 1e-12);
        assert_abs_diff_eq!(limits.zones.upper[1], 11.5 + 2.0 * sigma, epsilon = 1e-12);
        assert_abs_diff_eq!(limits.zones.lower[0], 11.5 - sigma, epsilon = 1e-12);
    }

    #[test]
    fn test_subgroup_center_line_ignores_partial_tail() {
        let series = MeasurementSeries::from_values(&[1.0, 3.0, 5.0, 7.0, 100.0])
            .unwrap()
            .with_subgroup_size(2)
            .unwrap();
        let limits = control_limits(&series).unwrap();
        // Subgroup means 2 and 6; ranges 2 and 2 → sigma = 2 / 1.128
        assert!((limits.center_line - 4.0).abs() < 1e-12);
        assert!((limits.sigma - 2.0 / 1.128).abs() < 1e-12);
    }

    #[test]
    fn test_z_scores_cover_every_sample() {
        let series = MeasurementSeries::from_values(&[1.0, 3.0, 5.0, 7.0, 100.0])
            .unwrap()
            .with_subgroup_size(2)
            .unwrap();
        let zones = ZoneAnalysis::from_series(&series).unwrap();
        assert_eq!(zones.points.len(), 5);
        assert_eq!(zones.points[4].zone, Zone::Beyond);
        assert_eq!(zones.points[4].side, Some(Side::Upper));
    }

    #[test]
    fn test_x_bar_r_limits() {
        // Subgroups [45,47,50,53,55] (mean 50, R 10) and [49,50,50,51,50] (mean 50, R 2)
        let series = MeasurementSeries::from_values(&[
            45.0, 47.0, 50.0, 53.0, 55.0, 49.0, 50.0, 50.0, 51.0, 50.0,
        ])
        .unwrap()
        .with_subgroup_size(5)
        .unwrap();
        let limits = subgroup_limits(&series).unwrap();
        assert_eq!(limits.subgroup_size, 5);
        assert_abs_diff_eq!(limits.x_bar.center_line, 50.0, epsilon = 1e-12);
        assert_abs_diff_eq!(limits.x_bar.ucl, 53.462, epsilon = 1e-9);
        assert_abs_diff_eq!(limits.x_bar.lcl, 46.538, epsilon = 1e-9);
        assert_abs_diff_eq!(limits.range.center_line, 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(limits.range.ucl, 12.684, epsilon = 1e-9);
        assert_abs_diff_eq!(limits.range.lcl, 0.0, epsilon = 1e-12);

        let zones = ZoneAnalysis::from_series(&series).unwrap();
        assert_eq!(zones.subgroup, Some(limits));
    }

    #[test]
    fn test_r_chart_lower_limit_for_large_subgroups() {
        // n = 7: D3 = 0.076, D4 = 1.924; ranges 6 and 2 → R-bar 4
        let series = MeasurementSeries::from_values(&[
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 3.0, 4.0, 5.0, 4.0, 3.0, 4.0, 5.0,
        ])
        .unwrap()
        .with_subgroup_size(7)
        .unwrap();
        let limits = subgroup_limits(&series).unwrap();
        assert_abs_diff_eq!(limits.range.lcl, 0.076 * 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(limits.range.ucl, 1.924 * 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_individuals_have_no_subgroup_limits() {
        let series = MeasurementSeries::from_values(&[10.0, 12.0, 11.0, 13.0]).unwrap();
        assert!(subgroup_limits(&series).is_none());
        assert!(ZoneAnalysis::from_series(&series).unwrap().subgroup.is_none());
        let short = MeasurementSeries::from_values(&[1.0, 2.0])
            .unwrap()
            .with_subgroup_size(3)
            .unwrap();
        assert!(subgroup_limits(&short).is_none());
    }

    #[test]
    fn test_constant_series_is_zero_variance() {
        let series = MeasurementSeries::from_values(&[5.0; 20]).unwrap();
        assert_eq!(
            ZoneAnalysis::from_series(&series).unwrap_err(),
            Unavailable::ZeroVariance
        );
    }

    #[test]
    fn test_single_point_is_insufficient() {
        let series = MeasurementSeries::from_values(&[5.0]).unwrap();
        assert_eq!(
            control_limits(&series).unwrap_err(),
            Unavailable::InsufficientData
        );
    }

    #[test]
    fn test_zone_counts() {
        let series =
            MeasurementSeries::from_values(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.5, 0.5]).unwrap();
        let zones = ZoneAnalysis::from_series(&series).unwrap();
        let (c, b, a, x) = zones.zone_counts();
        assert_eq!(c + b + a + x, 8);
    }
}
