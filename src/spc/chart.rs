//! Core control chart types.
//!
//! Defines the building blocks shared by the limit engine and the rule
//! engine: control limits with their sigma zones, standardized chart points,
//! the eight run rules, and violation records.
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Zone boundaries at CL ± 1σ, ± 2σ, ± 3σ.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneBoundaries {
    /// `[CL + σ, CL + 2σ, CL + 3σ]`
    pub upper: [f64; 3],
    /// `[CL - σ, CL - 2σ, CL - 3σ]`
    pub lower: [f64; 3],
}

/// Control limits for a chart.
///
/// Derived from a series snapshot and never mutated; a changed series
/// produces a new value.
///
/// # Invariants
///
/// - `sigma > 0`
/// - `lcl < center_line < ucl`
/// - `ucl = center_line + 3 sigma`, `lcl = center_line - 3 sigma`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    /// Center line (process mean, or mean of subgroup means).
    pub center_line: f64,
    /// Upper control limit (UCL = CL + 3 sigma).
    pub ucl: f64,
    /// Lower control limit (LCL = CL - 3 sigma).
    pub lcl: f64,
    /// Within-subgroup sigma estimate.
    pub sigma: f64,
    pub zones: ZoneBoundaries,
}

impl ControlLimits {
    /// Builds limits from a center line and a positive sigma.
    pub(crate) fn from_center(center_line: f64, sigma: f64) -> Self {
        let offset = |k: f64| k * sigma;
        Self {
            center_line,
            ucl: center_line + offset(3.0),
            lcl: center_line - offset(3.0),
            sigma,
            zones: ZoneBoundaries {
                upper: [1.0, 2.0, 3.0].map(|k| center_line + offset(k)),
                lower: [1.0, 2.0, 3.0].map(|k| center_line - offset(k)),
            },
        }
    }

    /// `(x - CL) / sigma`.
    pub fn standardize(&self, x: f64) -> f64 {
        (x - self.center_line) / self.sigma
    }
}

/// Center line and limits of a single chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartLimits {
    pub center_line: f64,
    pub ucl: f64,
    pub lcl: f64,
}

/// X-bar and R chart limits for subgrouped data.
///
/// - X-bar chart: CL = X-double-bar, UCL/LCL = CL ± A2 · R-bar
/// - R chart: CL = R-bar, UCL = D4 · R-bar, LCL = D3 · R-bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubgroupLimits {
    pub subgroup_size: usize,
    pub x_bar: ChartLimits,
    pub range: ChartLimits,
}

/// Sigma band a standardized point falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    /// |z| <= 1
    C,
    /// 1 < |z| <= 2
    B,
    /// 2 < |z| <= 3
    A,
    /// |z| > 3
    Beyond,
}

impl Zone {
    pub fn of(z: f64) -> Self {
        let a = z.abs();
        if a <= 1.0 {
            Zone::C
        } else if a <= 2.0 {
            Zone::B
        } else if a <= 3.0 {
            Zone::A
        } else {
            Zone::Beyond
        }
    }
}

/// Side of the center line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Upper,
    Lower,
}

impl Side {
    /// `None` for a point exactly on the center line.
    pub fn of(z: f64) -> Option<Self> {
        if z > 0.0 {
            Some(Side::Upper)
        } else if z < 0.0 {
            Some(Side::Lower)
        } else {
            None
        }
    }
}

/// A single sample on the chart with its standardized value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardizedPoint {
    /// The zero-based index of this point in the series.
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    /// The raw measurement.
    pub value: f64,
    /// `(value - CL) / sigma`
    pub z: f64,
    pub zone: Zone,
    pub side: Option<Side>,
}

/// The eight Western Electric / Nelson run rules.
///
/// Each rule is a pure predicate over a fixed-size trailing window of
/// standardized points ending at the point being evaluated.
///
/// # Reference
///
/// Nelson, L.S. (1984). "The Shewhart Control Chart — Tests for Special Causes",
/// *Journal of Quality Technology* 16(4), pp. 237-239.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rule {
    /// A single point beyond ±3σ (rule 1).
    BeyondLimits,

    /// 9 points in a row on same side of center line (rule 2).
    ///
    /// Indicates a sustained shift in the process mean.
    NineOneSide,

    /// 6 points in a row steadily increasing or decreasing (rule 3).
    SixTrend,

    /// 14 points in a row alternating up and down (rule 4).
    ///
    /// Indicates systematic variation (e.g., two alternating streams).
    FourteenAlternating,

    /// 2 out of 3 points beyond 2σ on same side (rule 5).
    TwoOfThreeBeyond2Sigma,

    /// 4 out of 5 points beyond 1σ on same side (rule 6).
    FourOfFiveBeyond1Sigma,

    /// 15 points in a row within 1σ of center line (rule 7).
    ///
    /// Indicates stratification: reduced variation suggesting mixed streams.
    FifteenWithin1Sigma,

    /// 8 points in a row beyond 1σ on either side (rule 8).
    ///
    /// Indicates a mixture pattern; points avoid the center zone.
    EightBeyond1Sigma,
}

impl Rule {
    pub const ALL: [Rule; 8] = [
        Rule::BeyondLimits,
        Rule::NineOneSide,
        Rule::SixTrend,
        Rule::FourteenAlternating,
        Rule::TwoOfThreeBeyond2Sigma,
        Rule::FourOfFiveBeyond1Sigma,
        Rule::FifteenWithin1Sigma,
        Rule::EightBeyond1Sigma,
    ];

    /// Largest window of any rule; the streaming buffer never holds more.
    pub const MAX_WINDOW: usize = 15;

    /// Rule number, 1..=8.
    pub fn id(self) -> u8 {
        match self {
            Rule::BeyondLimits => 1,
            Rule::NineOneSide => 2,
            Rule::SixTrend => 3,
            Rule::FourteenAlternating => 4,
            Rule::TwoOfThreeBeyond2Sigma => 5,
            Rule::FourOfFiveBeyond1Sigma => 6,
            Rule::FifteenWithin1Sigma => 7,
            Rule::EightBeyond1Sigma => 8,
        }
    }

    pub fn from_id(id: u8) -> Option<Rule> {
        Rule::ALL.get(usize::from(id).checked_sub(1)?).copied()
    }

    /// Number of trailing points the rule inspects.
    pub fn window(self) -> usize {
        match self {
            Rule::BeyondLimits => 1,
            Rule::NineOneSide => 9,
            Rule::SixTrend => 6,
            Rule::FourteenAlternating => 14,
            Rule::TwoOfThreeBeyond2Sigma => 3,
            Rule::FourOfFiveBeyond1Sigma => 5,
            Rule::FifteenWithin1Sigma => 15,
            Rule::EightBeyond1Sigma => 8,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Rule::BeyondLimits => "point beyond 3 sigma",
            Rule::NineOneSide => "9 points in a row on one side of the center line",
            Rule::SixTrend => "6 points in a row steadily increasing or decreasing",
            Rule::FourteenAlternating => "14 points in a row alternating up and down",
            Rule::TwoOfThreeBeyond2Sigma => "2 of 3 points beyond 2 sigma on the same side",
            Rule::FourOfFiveBeyond1Sigma => "4 of 5 points beyond 1 sigma on the same side",
            Rule::FifteenWithin1Sigma => "15 points in a row within 1 sigma",
            Rule::EightBeyond1Sigma => "8 points in a row beyond 1 sigma on either side",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {} ({})", self.id(), self.description())
    }
}

impl From<Rule> for u8 {
    fn from(rule: Rule) -> u8 {
        rule.id()
    }
}

impl TryFrom<u8> for Rule {
    type Error = String;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Rule::from_id(id).ok_or_else(|| format!("rule id must be 1..=8, got {id}"))
    }
}

/// A rule firing at a point.
///
/// Severity is not part of the record; it is looked up from the caller's
/// threshold configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// The index of the point where the violation was detected.
    pub point_index: usize,
    pub rule: Rule,
}
