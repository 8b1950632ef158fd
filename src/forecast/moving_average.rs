//! Moving-average forecast.
//!
//! The forecast is flat at the average of the last `window` values. With
//! fewer than `window` values the last observation is used as-is. The band
//! half-width is `z · σ` at every step; it does not widen with the horizon.

use super::method::{Forecaster, History, Projection};
use crate::error::SpcError;

/// Trailing simple moving average.
#[derive(Debug, Clone, Copy)]
pub struct MovingAverage {
    window: usize,
}

impl MovingAverage {
    /// # Errors
    ///
    /// [`SpcError::InvalidParameter`] if `window` is zero.
    pub fn new(window: usize) -> Result<Self, SpcError> {
        if window == 0 {
            return Err(SpcError::InvalidParameter {
                name: "window",
                value: 0.0,
            });
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Average of the last `window` values, or the last value when the
    /// history is shorter than the window.
    pub fn level(&self, values: &[f64]) -> Option<f64> {
        let n = values.len();
        if n == 0 {
            return None;
        }
        if n < self.window {
            return Some(values[n - 1]);
        }
        let tail = &values[n - self.window..];
        Some(tail.iter().sum::<f64>() / self.window as f64)
    }
}

impl Forecaster for MovingAverage {
    fn project(&self, history: &History<'_>, horizon: usize, z: f64) -> Vec<Projection> {
        let Some(level) = self.level(history.values) else {
            return Vec::new();
        };
        let half_width = z * history.std_dev;
        vec![Projection { point: level, half_width }; horizon]
    }
}
