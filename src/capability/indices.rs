//! Process capability indices (Cp, Cpk, Pp, Ppk, Ca, Cpm).
//!
//! Process capability indices quantify how well a process output fits within
//! specification limits. Short-term indices (Cp, Cpk) use within-group
//! variation, while long-term indices (Pp, Ppk) use overall variation.
//!
//! Degenerate inputs never produce infinities or zeros: an index that cannot
//! be computed is `None`, and the reason is recorded in
//! [`CapabilityIndices::flags`].
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.,
//!   Chapter 8.
//! - Kane (1986), "Process Capability Indices", *Journal of Quality Technology*
//!   18(1), pp. 41--52.
//! - Chan, Cheng & Spiring (1988), "A New Measure of Process Capability: Cpm",
//!   *Journal of Quality Technology* 20(3), pp. 162--175.

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use super::sigma;
use crate::error::SpcError;
use crate::series::MeasurementSeries;

/// Specification limits for capability analysis.
///
/// Any combination of limits may be absent. Two-sided indices (Cp, Pp, Ca,
/// Cpm) need both USL and LSL; Cpk/Ppk fall back to the one-sided index that
/// is available. The target defaults to the midpoint of the limits.
///
/// # Examples
///
/// ```
/// use spc_core::capability::SpecLimits;
///
/// // Two-sided specification: LSL = 9.0, USL = 11.0
/// let spec = SpecLimits::new(Some(11.0), Some(9.0)).unwrap();
/// assert_eq!(spec.target(), Some(10.0));
///
/// // Upper limit only
/// assert!(SpecLimits::new(Some(10.0), None).is_ok());
///
/// // Error: USL <= LSL
/// assert!(SpecLimits::new(Some(5.0), Some(10.0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpecLimits")]
pub struct SpecLimits {
    usl: Option<f64>,
    lsl: Option<f64>,
    target: Option<f64>,
}

/// Unchecked wire form of [`SpecLimits`]; decoding goes through
/// [`SpecLimits::new`].
#[derive(Deserialize)]
struct RawSpecLimits {
    #[serde(default)]
    usl: Option<f64>,
    #[serde(default)]
    lsl: Option<f64>,
    #[serde(default)]
    target: Option<f64>,
}

impl TryFrom<RawSpecLimits> for SpecLimits {
    type Error = SpcError;

    fn try_from(raw: RawSpecLimits) -> Result<Self, Self::Error> {
        let limits = SpecLimits::new(raw.usl, raw.lsl)?;
        match raw.target {
            Some(target) => limits.with_target(target),
            None => Ok(limits),
        }
    }
}

/// Why some capability indices are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityFlag {
    /// Fewer than 2 samples, or no complete subgroup for the within estimator.
    InsufficientData,
    /// A sigma estimate is exactly zero: not enough variation to assess.
    ZeroVariance,
    /// USL or LSL is absent; two-sided indices are unavailable.
    MissingSpecLimit,
}

/// Computed capability indices.
///
/// # Index interpretation
///
/// | Index | Value | Interpretation |
/// |-------|-------|----------------|
/// | Cp/Pp | >= 1.33 | Process is capable |
/// | Cpk/Ppk | >= 1.33 | Process is capable and centered |
/// | Ca | near 0 | Mean is on target |
///
/// Reference: Montgomery (2019), Chapter 8, Table 8.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityIndices {
    /// Cp = (USL - LSL) / (6 * sigma_within). Requires both limits.
    pub cp: Option<f64>,
    /// Cpk = min(Cpu, Cpl), or the one-sided index that exists.
    pub cpk: Option<f64>,
    /// Cpu = (USL - mean) / (3 * sigma_within).
    pub cpu: Option<f64>,
    /// Cpl = (mean - LSL) / (3 * sigma_within).
    pub cpl: Option<f64>,
    /// Pp = (USL - LSL) / (6 * sigma_overall). Requires both limits.
    pub pp: Option<f64>,
    /// Ppk = min(Ppu, Ppl), or the one-sided index that exists.
    pub ppk: Option<f64>,
    pub ppu: Option<f64>,
    pub ppl: Option<f64>,
    /// Ca = (mean - target) / ((USL - LSL) / 2). Signed; requires both limits.
    pub ca: Option<f64>,
    /// Cpm = Cp / sqrt(1 + ((mean - target) / sigma_within)^2).
    ///
    /// Reference: Chan, Cheng & Spiring (1988).
    pub cpm: Option<f64>,
    /// Mean of all samples.
    pub mean: f64,
    /// Short-term (within-subgroup) standard deviation.
    pub within_sigma: Option<f64>,
    /// Long-term (overall, population) standard deviation.
    pub overall_sigma: Option<f64>,
    /// Reasons for any `None` index above.
    pub flags: Vec<CapabilityFlag>,
}

impl CapabilityIndices {
    /// Returns `true` if `flag` was raised.
    pub fn has_flag(&self, flag: CapabilityFlag) -> bool {
        self.flags.contains(&flag)
    }

    fn unavailable(mean: f64, flags: Vec<CapabilityFlag>) -> Self {
        Self {
            cp: None,
            cpk: None,
            cpu: None,
            cpl: None,
            pp: None,
            ppk: None,
            ppu: None,
            ppl: None,
            ca: None,
            cpm: None,
            mean,
            within_sigma: None,
            overall_sigma: None,
            flags,
        }
    }
}

impl SpecLimits {
    /// Creates specification limits.
    ///
    /// # Errors
    ///
    /// Returns [`SpcError::InvalidSpecLimits`] if:
    /// - `usl <= lsl` when both are provided
    /// - either limit is non-finite (NaN or infinity)
    pub fn new(usl: Option<f64>, lsl: Option<f64>) -> Result<Self, SpcError> {
        if usl.is_some_and(|u| !u.is_finite()) {
            return Err(SpcError::InvalidSpecLimits("USL must be finite"));
        }
        if lsl.is_some_and(|l| !l.is_finite()) {
            return Err(SpcError::InvalidSpecLimits("LSL must be finite"));
        }
        if let (Some(u), Some(l)) = (usl, lsl) {
            if u <= l {
                return Err(SpcError::InvalidSpecLimits("USL must be greater than LSL"));
            }
        }
        Ok(Self {
            usl,
            lsl,
            target: None,
        })
    }

    /// Sets an explicit target value for Ca and Cpm.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidSpecLimits`] if `target` is not finite.
    pub fn with_target(mut self, target: f64) -> Result<Self, SpcError> {
        if !target.is_finite() {
            return Err(SpcError::InvalidSpecLimits("target must be finite"));
        }
        self.target = Some(target);
        Ok(self)
    }

    pub fn usl(&self) -> Option<f64> {
        self.usl
    }

    pub fn lsl(&self) -> Option<f64> {
        self.lsl
    }

    /// The explicit target, or the midpoint `(USL + LSL) / 2` when both
    /// limits are present.
    pub fn target(&self) -> Option<f64> {
        self.target.or(match (self.usl, self.lsl) {
            (Some(u), Some(l)) => Some((u + l) / 2.0),
            _ => None,
        })
    }

    /// Computes all capability indices for `series`.
    ///
    /// Sigma within comes from the series' subgroup size (moving range for
    /// individuals, R-bar/d2 for subgroups); sigma overall is the population
    /// standard deviation of all samples.
    ///
    /// # Examples
    ///
    /// ```
    /// use spc_core::capability::{CapabilityFlag, SpecLimits};
    /// use spc_core::series::MeasurementSeries;
    ///
    /// let spec = SpecLimits::new(Some(11.0), Some(9.0)).unwrap();
    /// let series = MeasurementSeries::from_values(&[9.5, 10.0, 10.2, 9.8, 10.1, 10.3, 9.9, 10.0])
    ///     .unwrap();
    ///
    /// let indices = spec.compute(&series);
    /// assert!(indices.cp.unwrap() > 0.0);
    /// assert!(indices.cpk.unwrap() <= indices.cp.unwrap());
    /// assert!(indices.flags.is_empty());
    ///
    /// // Constant data: no variation to assess, indices are unavailable.
    /// let flat = MeasurementSeries::from_values(&[10.0; 20]).unwrap();
    /// let indices = spec.compute(&flat);
    /// assert!(indices.cp.is_none());
    /// assert!(indices.has_flag(CapabilityFlag::ZeroVariance));
    /// ```
    pub fn compute(&self, series: &MeasurementSeries) -> CapabilityIndices {
        let values = series.values();
        let x_bar = stats::mean(values).unwrap_or(values[0]);

        let mut flags = Vec::new();
        if self.usl.is_none() || self.lsl.is_none() {
            flags.push(CapabilityFlag::MissingSpecLimit);
        }
        if values.len() < 2 {
            flags.push(CapabilityFlag::InsufficientData);
            return CapabilityIndices::unavailable(x_bar, flags);
        }

        let sigma_within = sigma::within_sigma(series);
        let sigma_overall = sigma::overall_sigma(values);
        if sigma_within.is_none() || sigma_overall.is_none() {
            flags.push(CapabilityFlag::InsufficientData);
        }
        if sigma_within == Some(0.0) || sigma_overall == Some(0.0) {
            flags.push(CapabilityFlag::ZeroVariance);
        }

        let mut indices = self.compute_indices(
            x_bar,
            sigma_within.filter(|s| *s > 0.0),
            sigma_overall.filter(|s| *s > 0.0),
        );
        indices.within_sigma = sigma_within;
        indices.overall_sigma = sigma_overall;
        indices.flags = flags;
        indices
    }

    /// Computes all indices given a mean and usable (positive) sigma values.
    fn compute_indices(
        &self,
        x_bar: f64,
        sigma_within: Option<f64>,
        sigma_overall: Option<f64>,
    ) -> CapabilityIndices {
        // Short-term indices (within-group sigma)
        let cpu = self.upper_index(x_bar, sigma_within);
        let cpl = self.lower_index(x_bar, sigma_within);
        let cp = self.spread_index(sigma_within);
        let cpk = min_of(cpu, cpl);

        // Long-term indices (overall sigma)
        let ppu = self.upper_index(x_bar, sigma_overall);
        let ppl = self.lower_index(x_bar, sigma_overall);
        let pp = self.spread_index(sigma_overall);
        let ppk = min_of(ppu, ppl);

        let half_width = match (self.usl, self.lsl) {
            (Some(u), Some(l)) => Some((u - l) / 2.0),
            _ => None,
        };
        let ca = half_width
            .filter(|w| *w > 0.0)
            .zip(self.target())
            .map(|(w, target)| (x_bar - target) / w);

        // Taguchi Cpm index
        let cpm = cp.zip(sigma_within).and_then(|(cp_val, s)| {
            let deviation_ratio = (x_bar - self.target()?) / s;
            Some(cp_val / (1.0 + deviation_ratio * deviation_ratio).sqrt())
        });

        CapabilityIndices {
            cp,
            cpk,
            cpu,
            cpl,
            pp,
            ppk,
            ppu,
            ppl,
            ca,
            cpm,
            mean: x_bar,
            within_sigma: sigma_within,
            overall_sigma: sigma_overall,
            flags: Vec::new(),
        }
    }

    fn upper_index(&self, x_bar: f64, sigma: Option<f64>) -> Option<f64> {
        let (u, s) = self.usl.zip(sigma)?;
        Some((u - x_bar) / (3.0 * s))
    }

    fn lower_index(&self, x_bar: f64, sigma: Option<f64>) -> Option<f64> {
        let (l, s) = self.lsl.zip(sigma)?;
        Some((x_bar - l) / (3.0 * s))
    }

    fn spread_index(&self, sigma: Option<f64>) -> Option<f64> {
        match (self.usl, self.lsl, sigma) {
            (Some(u), Some(l), Some(s)) => Some((u - l) / (6.0 * s)),
            _ => None,
        }
    }
}

fn min_of(upper: Option<f64>, lower: Option<f64>) -> Option<f64> {
    match (upper, lower) {
        (Some(u), Some(l)) => Some(u.min(l)),
        (Some(u), None) => Some(u),
        (None, Some(l)) => Some(l),
        (None, None) => None,
    }
}
