//! Forecasting method selection.
//!
//! Every method implements [`Forecaster`]: given the history and a horizon it
//! produces one [`Projection`] per future step. [`ForecastMethod`] is the
//! serializable selector. Its parameters are only trusted once
//! [`ForecastMethod::forecaster`] has turned it into a validated strategy.

use serde::{Deserialize, Serialize};

use super::linear::LinearTrend;
use super::moving_average::MovingAverage;
use super::ses::ExponentialSmoothing;
use super::weighted::WeightedMovingAverage;
use crate::capability::overall_sigma;
use crate::error::SpcError;

/// Minimum number of historical points for any method.
pub const MIN_HISTORY: usize = 3;

/// Default trailing window for [`ForecastMethod::MovingAverage`].
pub const DEFAULT_MA_WINDOW: usize = 5;

/// Default smoothing constant for [`ForecastMethod::ExponentialSmoothing`].
pub const DEFAULT_ALPHA: f64 = 0.3;

/// Historical values plus their spread, shared by all methods.
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    pub values: &'a [f64],
    /// Population standard deviation of `values`.
    pub std_dev: f64,
}

impl<'a> History<'a> {
    /// `None` with fewer than [`MIN_HISTORY`] values.
    pub fn new(values: &'a [f64]) -> Option<Self> {
        if values.len() < MIN_HISTORY {
            return None;
        }
        let std_dev = overall_sigma(values)?;
        Some(Self { values, std_dev })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent value.
    pub fn last(&self) -> f64 {
        self.values[self.values.len() - 1]
    }
}

/// One future step: point forecast and interval half-width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub point: f64,
    pub half_width: f64,
}

/// Produces the next `horizon` points with confidence bounds.
pub trait Forecaster {
    /// Projects steps `1..=horizon`. `z` is the two-sided normal quantile
    /// of the requested confidence level.
    fn project(&self, history: &History<'_>, horizon: usize, z: f64) -> Vec<Projection>;
}

/// Confidence level of the forecast band.
///
/// Intervals use the normal quantile for every method, including linear
/// regression where a Student-t quantile would be exact. Short histories
/// therefore get slightly narrow regression bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    #[serde(rename = "0.90")]
    P90,
    #[default]
    #[serde(rename = "0.95")]
    P95,
    #[serde(rename = "0.99")]
    P99,
}

impl ConfidenceLevel {
    /// Two-sided standard normal quantile.
    pub fn z(self) -> f64 {
        match self {
            ConfidenceLevel::P90 => 1.645,
            ConfidenceLevel::P95 => 1.96,
            ConfidenceLevel::P99 => 2.576,
        }
    }
}

fn default_window() -> usize {
    DEFAULT_MA_WINDOW
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

/// Forecasting method with its parameters.
///
/// Serialized with an internal `method` tag:
///
/// ```
/// use spc_core::forecast::ForecastMethod;
///
/// let m: ForecastMethod = serde_json::from_str(r#"{"method":"moving_average"}"#).unwrap();
/// assert_eq!(m, ForecastMethod::MovingAverage { window: 5 });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ForecastMethod {
    /// OLS of value against period index.
    #[default]
    LinearRegression,
    /// Flat at the trailing `window` average.
    MovingAverage {
        #[serde(default = "default_window")]
        window: usize,
    },
    /// Flat at the last exponentially smoothed level.
    ExponentialSmoothing {
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    /// Weighted average of the last five points plus a short-term trend.
    WeightedMovingAverage,
}

impl ForecastMethod {
    /// Builds the validated forecaster for this method.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidParameter`] for a zero window or an alpha outside `(0, 1)`.
    pub fn forecaster(&self) -> Result<Box<dyn Forecaster + Send + Sync>, SpcError> {
        Ok(match *self {
            ForecastMethod::LinearRegression => Box::new(LinearTrend),
            ForecastMethod::MovingAverage { window } => Box::new(MovingAverage::new(window)?),
            ForecastMethod::ExponentialSmoothing { alpha } => {
                Box::new(ExponentialSmoothing::new(alpha)?)
            }
            ForecastMethod::WeightedMovingAverage => Box::new(WeightedMovingAverage),
        })
    }

    /// Checks method parameters.
    ///
    /// # Errors
    ///
    /// Same as [`forecaster`](Self::forecaster).
    pub fn validate(&self) -> Result<(), SpcError> {
        self.forecaster().map(|_| ())
    }

    pub fn name(&self) -> &'static str {
        match self {
            ForecastMethod::LinearRegression => "linear_regression",
            ForecastMethod::MovingAverage { .. } => "moving_average",
            ForecastMethod::ExponentialSmoothing { .. } => "exponential_smoothing",
            ForecastMethod::WeightedMovingAverage => "weighted_moving_average",
        }
    }
}
