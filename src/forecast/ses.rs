//! Exponential smoothing forecast.
//!
//! Level-only smoothing for series without trend or seasonality.
//!
//! # Algorithm
//!
//! ```text
//! S_0 = x_0
//! S_t = α x_t + (1 - α) S_{t-1}
//! ```
//!
//! where α ∈ (0, 1) is the smoothing constant. The forecast is flat at the
//! last level; the half-width at step `i` is `z · σ · √(1 + (i-1) α²)`.
//!
//! # Reference
//!
//! Brown, R.G. (1956). *Exponential Smoothing for Predicting Demand*.

use super::method::{Forecaster, History, Projection};
use crate::error::SpcError;

/// Result of simple exponential smoothing at each time step.
#[derive(Debug, Clone)]
pub struct SesResult {
    /// Smoothed values.
    pub smoothed: Vec<f64>,
    /// One-step-ahead forecast for the next period.
    pub forecast: f64,
}

/// Simple exponential smoothing.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialSmoothing {
    alpha: f64,
}

impl ExponentialSmoothing {
    /// Creates a new smoother.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidParameter`] if alpha is non-finite or outside `(0, 1)`.
    pub fn new(alpha: f64) -> Result<Self, SpcError> {
        if !alpha.is_finite() || alpha <= 0.0 || alpha >= 1.0 {
            return Err(SpcError::InvalidParameter {
                name: "alpha",
                value: alpha,
            });
        }
        Ok(Self { alpha })
    }

    /// Returns the smoothing constant α.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Applies smoothing to the given data.
    ///
    /// Returns `None` if data is empty.
    pub fn smooth(&self, data: &[f64]) -> Option<SesResult> {
        let (&first, rest) = data.split_first()?;
        let mut smoothed = Vec::with_capacity(data.len());
        let mut s = first;
        smoothed.push(s);

        for &x in rest {
            s = self.alpha * x + (1.0 - self.alpha) * s;
            smoothed.push(s);
        }

        Some(SesResult {
            smoothed,
            forecast: s,
        })
    }
}

impl Forecaster for ExponentialSmoothing {
    fn project(&self, history: &History<'_>, horizon: usize, z: f64) -> Vec<Projection> {
        let Some(result) = self.smooth(history.values) else {
            return Vec::new();
        };
        let a2 = self.alpha * self.alpha;
        (1..=horizon)
            .map(|i| Projection {
                point: result.forecast,
                half_width: z * history.std_dev * (1.0 + (i - 1) as f64 * a2).sqrt(),
            })
            .collect()
    }
}
