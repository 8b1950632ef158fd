//! Direction and strength of a metric's trend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::regression::fit_index;

/// Slopes smaller than this in magnitude count as flat.
pub const STABLE_SLOPE: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// How well a straight line explains the history (by R²).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    /// R² > 0.7
    Strong,
    /// R² > 0.4
    Moderate,
    Weak,
}

/// OLS trend of a series against its period index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub direction: TrendDirection,
    pub strength: TrendStrength,
    pub slope: f64,
    pub r_squared: f64,
}

impl TrendSummary {
    /// `None` with fewer than three values.
    ///
    /// A stable trend is always reported as weak.
    ///
    /// ```
    /// use spc_core::forecast::{TrendDirection, TrendStrength, TrendSummary};
    ///
    /// let t = TrendSummary::from_values(&[1.60, 1.52, 1.45, 1.38, 1.30]).unwrap();
    /// assert_eq!(t.direction, TrendDirection::Down);
    /// assert_eq!(t.strength, TrendStrength::Strong);
    /// ```
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let fit = fit_index(values)?;
        let (direction, strength) = if fit.slope.abs() < STABLE_SLOPE {
            (TrendDirection::Stable, TrendStrength::Weak)
        } else {
            let direction = if fit.slope > 0.0 {
                TrendDirection::Up
            } else {
                TrendDirection::Down
            };
            let strength = if fit.r_squared > 0.7 {
                TrendStrength::Strong
            } else if fit.r_squared > 0.4 {
                TrendStrength::Moderate
            } else {
                TrendStrength::Weak
            };
            (direction, strength)
        };
        Some(Self {
            direction,
            strength,
            slope: fit.slope,
            r_squared: fit.r_squared,
        })
    }
}

impl fmt::Display for TrendSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
            TrendDirection::Stable => "stable",
        };
        let strength = match self.strength {
            TrendStrength::Strong => "strong",
            TrendStrength::Moderate => "moderate",
            TrendStrength::Weak => "weak",
        };
        write!(f, "{dir} ({strength})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_is_stable_weak() {
        let t = TrendSummary::from_values(&[1.33, 1.3305, 1.3298, 1.3301]).unwrap();
        assert_eq!(t.direction, TrendDirection::Stable);
        assert_eq!(t.strength, TrendStrength::Weak);
        assert_eq!(t.to_string(), "stable (weak)");
    }

    #[test]
    fn test_noisy_upward_is_not_strong() {
        let t = TrendSummary::from_values(&[1.0, 1.4, 1.05, 1.5, 1.1, 1.45]).unwrap();
        assert_eq!(t.direction, TrendDirection::Up);
        assert_ne!(t.strength, TrendStrength::Strong);
    }

    #[test]
    fn test_needs_three_points() {
        assert!(TrendSummary::from_values(&[1.0, 2.0]).is_none());
    }
}
