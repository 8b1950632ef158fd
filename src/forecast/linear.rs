//! Linear trend forecast.
//!
//! Fits `value = intercept + slope · t` over period indices `t = 0..n-1` and
//! extends the line. Step `i` sits at `x0 = n + i - 1` with the classical
//! prediction-interval half-width
//!
//! ```text
//! z · se · √(1 + 1/n + (x0 - x̄)² / Sxx)
//! ```
//!
//! where `se` is the residual standard error. The band widens monotonically
//! as the horizon moves away from the center of the history.

use super::method::{Forecaster, History, Projection};
use crate::regression::fit_index;

/// OLS trend extrapolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTrend;

impl Forecaster for LinearTrend {
    fn project(&self, history: &History<'_>, horizon: usize, z: f64) -> Vec<Projection> {
        let Some(fit) = fit_index(history.values) else {
            return Vec::new();
        };
        let n = history.len();
        (1..=horizon)
            .map(|i| {
                let x0 = (n + i - 1) as f64;
                Projection {
                    point: fit.predict(x0),
                    half_width: z * fit.prediction_se(x0),
                }
            })
            .collect()
    }
}
