//! Simple linear regression.
//!
//! Ordinary least squares fit of `y = intercept + slope · x`, with the
//! residual standard error and the x spread needed for prediction intervals.
//!
//! # Examples
//!
//! ```
//! use spc_core::regression::fit_line;
//!
//! let x = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let y = [2.1, 3.9, 6.1, 7.9, 10.1];
//! let fit = fit_line(&x, &y).unwrap();
//! assert!((fit.slope - 2.0).abs() < 0.1);
//! assert!((fit.intercept - 0.1).abs() < 0.2);
//! assert!(fit.r_squared > 0.99);
//! ```

use u_numflow::stats;

/// Result of a simple linear regression: y = intercept + slope · x.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    /// Slope coefficient (β₁).
    pub slope: f64,
    /// Intercept (β₀).
    pub intercept: f64,
    /// Coefficient of determination, clamped to `[0, 1]`.
    ///
    /// A constant `y` is fitted exactly and reports 1.
    pub r_squared: f64,
    /// Residual standard error √(SSE/(n-2)).
    pub residual_se: f64,
    /// Mean of x.
    pub x_mean: f64,
    /// Σ(xᵢ - x̄)².
    pub sxx: f64,
    /// Sample size.
    pub n: usize,
}

impl LinearFit {
    /// Point prediction at `x`.
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    /// Standard error of a new observation at `x0`:
    /// `se · √(1 + 1/n + (x0 - x̄)² / Sxx)`.
    pub fn prediction_se(&self, x0: f64) -> f64 {
        let n = self.n as f64;
        let leverage = (x0 - self.x_mean).powi(2) / self.sxx;
        self.residual_se * (1.0 + 1.0 / n + leverage).sqrt()
    }
}

/// Fits `y` on `x` by ordinary least squares.
///
/// Returns `None` if:
/// - fewer than 3 points or `x.len() != y.len()`
/// - any value is non-finite
/// - `x` has zero variance
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len();
    if n < 3 || n != y.len() {
        return None;
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return None;
    }

    let x_mean = stats::mean(x)?;
    let y_mean = stats::mean(y)?;
    let x_var = stats::variance(x)?;
    let cov = stats::covariance(x, y)?;

    if x_var < 1e-300 {
        return None;
    }

    let slope = cov / x_var;
    let intercept = y_mean - slope * x_mean;

    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - (intercept + slope * xi)).powi(2))
        .sum();
    let ss_tot: f64 = y.iter().map(|&yi| (yi - y_mean).powi(2)).sum();
    let sxx: f64 = x.iter().map(|&xi| (xi - x_mean).powi(2)).sum();

    let r_squared = if ss_tot > 1e-300 {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    } else {
        1.0
    };

    Some(LinearFit {
        slope,
        intercept,
        r_squared,
        residual_se: (ss_res / (n as f64 - 2.0)).sqrt(),
        x_mean,
        sxx,
        n,
    })
}

/// Fits `y` against its own index `0, 1, ..., n-1`.
pub fn fit_index(y: &[f64]) -> Option<LinearFit> {
    let x: Vec<f64> = (0..y.len()).map(|i| i as f64).collect();
    fit_line(&x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [3.0, 5.0, 7.0, 9.0, 11.0];
        let fit = fit_line(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-10);
        assert!((fit.intercept - 1.0).abs() < 1e-10);
        assert!((fit.r_squared - 1.0).abs() < 1e-10);
        assert!(fit.residual_se.abs() < 1e-10);
        assert!((fit.predict(6.0) - 13.0).abs() < 1e-10);
    }

    #[test]
    fn test_index_fit_sxx() {
        // x = 0..5, x̄ = 2, Sxx = 4 + 1 + 0 + 1 + 4
        let fit = fit_index(&[1.0, 2.0, 1.5, 2.5, 3.0]).unwrap();
        assert!((fit.x_mean - 2.0).abs() < 1e-12);
        assert!((fit.sxx - 10.0).abs() < 1e-12);
        assert_eq!(fit.n, 5);
    }

    #[test]
    fn test_residual_se() {
        // y = [1, 3, 2]: slope 0.5, fitted [1.5, 2, 2.5], SSE = 0.25+1+0.25
        let fit = fit_index(&[1.0, 3.0, 2.0]).unwrap();
        assert!((fit.slope - 0.5).abs() < 1e-12);
        assert!((fit.residual_se - 1.5_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_prediction_se_grows_away_from_center() {
        let fit = fit_index(&[1.0, 3.0, 2.0, 4.0, 3.5, 5.0]).unwrap();
        let near = fit.prediction_se(fit.x_mean);
        let far = fit.prediction_se(fit.x_mean + 10.0);
        assert!(far > near);
        let n = fit.n as f64;
        assert!((near - fit.residual_se * (1.0 + 1.0 / n).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_y() {
        let fit = fit_index(&[1.33; 6]).unwrap();
        assert!(fit.slope.abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_insufficient_or_degenerate() {
        assert!(fit_index(&[1.0, 2.0]).is_none());
        assert!(fit_line(&[1.0, 2.0, 3.0], &[1.0, 2.0]).is_none());
        assert!(fit_line(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(fit_index(&[1.0, f64::NAN, 3.0]).is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn r_squared_bounded(
            y in proptest::collection::vec(-1e3_f64..1e3, 3..=40),
        ) {
            if let Some(fit) = fit_index(&y) {
                prop_assert!((0.0..=1.0).contains(&fit.r_squared), "R² = {}", fit.r_squared);
                prop_assert!(fit.residual_se >= 0.0);
            }
        }

        #[test]
        fn fit_passes_through_means(
            data in proptest::collection::vec(-1e3_f64..1e3, 5..=30)
                .prop_flat_map(|x| {
                    let n = x.len();
                    (Just(x), proptest::collection::vec(-1e3_f64..1e3, n..=n))
                })
        ) {
            let (x, y) = data;
            if let Some(fit) = fit_line(&x, &y) {
                let y_mean = y.iter().sum::<f64>() / y.len() as f64;
                prop_assert!((fit.predict(fit.x_mean) - y_mean).abs() < 1e-6 * (1.0 + y_mean.abs()));
            }
        }
    }
}
