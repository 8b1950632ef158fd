//! CPK (or any metric) forecasting with confidence bands.
//!
//! A forecast echoes the history with zero-width bounds, then appends
//! `horizon` synthetic points from the selected [`ForecastMethod`].
//!
//! # Methods
//!
//! | Method | Point forecast | Half-width at step `i` |
//! |--------|----------------|------------------------|
//! | linear regression | `slope·(n+i-1) + intercept` | `z·se·√(1 + 1/n + (x0-x̄)²/Sxx)` |
//! | moving average | last `w`-average | `z·σ` |
//! | exponential smoothing | last level | `z·σ·√(1 + (i-1)α²)` |
//! | weighted moving average | `WMA + trend·i` | `z·σ·√i` |
//!
//! σ is the population standard deviation of the history.
//!
//! # Examples
//!
//! ```
//! use spc_core::forecast::{forecast, ForecastRequest};
//! use spc_core::series::MeasurementSeries;
//!
//! let cpk = [1.45, 1.42, 1.40, 1.38, 1.37, 1.35, 1.31, 1.30, 1.28, 1.25];
//! let series = MeasurementSeries::from_values(&cpk).unwrap();
//! let result = forecast(&series, &ForecastRequest::default()).unwrap();
//! assert_eq!(result.points.len(), 17);
//! assert_eq!(result.future().count(), 7);
//! ```

mod linear;
mod method;
mod moving_average;
mod ses;
mod trend;
mod weighted;

pub use linear::LinearTrend;
pub use method::{
    ConfidenceLevel, ForecastMethod, Forecaster, History, Projection, DEFAULT_ALPHA,
    DEFAULT_MA_WINDOW, MIN_HISTORY,
};
pub use moving_average::MovingAverage;
pub use ses::{ExponentialSmoothing, SesResult};
pub use trend::{TrendDirection, TrendStrength, TrendSummary, STABLE_SLOPE};
pub use weighted::{WeightedMovingAverage, WEIGHTS};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SpcError;
use crate::series::MeasurementSeries;

/// Default number of future periods.
pub const DEFAULT_HORIZON: usize = 7;

fn default_horizon() -> usize {
    DEFAULT_HORIZON
}

/// What to forecast and how.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    #[serde(flatten)]
    pub method: ForecastMethod,
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    #[serde(default)]
    pub confidence: ConfidenceLevel,
}

impl Default for ForecastRequest {
    fn default() -> Self {
        Self {
            method: ForecastMethod::default(),
            horizon: DEFAULT_HORIZON,
            confidence: ConfidenceLevel::default(),
        }
    }
}

impl ForecastRequest {
    pub fn new(method: ForecastMethod) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    pub fn with_confidence(mut self, confidence: ConfidenceLevel) -> Self {
        self.confidence = confidence;
        self
    }
}

/// One point of a forecast result.
///
/// Historical points have `lower_bound == upper_bound == point_forecast`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: DateTime<Utc>,
    pub point_forecast: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub is_forecast: bool,
}

impl ForecastPoint {
    fn actual(date: DateTime<Utc>, value: f64) -> Self {
        Self {
            date,
            point_forecast: value,
            lower_bound: value,
            upper_bound: value,
            is_forecast: false,
        }
    }

    /// `upper_bound - lower_bound`.
    pub fn width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }
}

/// Historical echo followed by synthetic points.
///
/// Empty when the history is too short; that is a valid result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub method: ForecastMethod,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn historical(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| !p.is_forecast)
    }

    pub fn future(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| p.is_forecast)
    }
}

/// Forecasts `request.horizon` periods past the end of `series`.
///
/// Future dates continue at the mean spacing of the history (one day if all
/// timestamps coincide).
///
/// # Errors
///
/// [`SpcError::InvalidParameter`] if the method parameters are invalid.
pub fn forecast(
    series: &MeasurementSeries,
    request: &ForecastRequest,
) -> Result<Forecast, SpcError> {
    let forecaster = request.method.forecaster()?;
    let empty = Forecast {
        method: request.method,
        points: Vec::new(),
    };
    let Some(history) = History::new(series.values()) else {
        tracing::debug!(
            len = series.len(),
            method = request.method.name(),
            "history too short to forecast"
        );
        return Ok(empty);
    };

    let projections = forecaster.project(&history, request.horizon, request.confidence.z());

    let step = period(series);
    let last = series.last_timestamp();
    let mut points: Vec<ForecastPoint> = series
        .samples()
        .iter()
        .map(|s| ForecastPoint::actual(s.timestamp, s.value))
        .collect();
    points.reserve(projections.len());
    for (i, p) in projections.into_iter().enumerate() {
        let offset = step * i32::try_from(i + 1).unwrap_or(i32::MAX);
        points.push(ForecastPoint {
            date: last
                .checked_add_signed(offset)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            point_forecast: p.point,
            lower_bound: p.point - p.half_width,
            upper_bound: p.point + p.half_width,
            is_forecast: true,
        });
    }

    Ok(Forecast {
        method: request.method,
        points,
    })
}

fn period(series: &MeasurementSeries) -> Duration {
    let gaps = i32::try_from(series.len().saturating_sub(1)).unwrap_or(i32::MAX);
    let span = series.last_timestamp() - series.first_timestamp();
    if gaps == 0 || span <= Duration::zero() {
        return Duration::days(1);
    }
    let step = span / gaps;
    if step <= Duration::zero() {
        Duration::days(1)
    } else {
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Sample;
    use chrono::TimeZone;

    const CPK: [f64; 10] = [1.45, 1.42, 1.40, 1.38, 1.37, 1.35, 1.31, 1.30, 1.28, 1.25];

    fn cpk_series() -> MeasurementSeries {
        MeasurementSeries::from_values(&CPK).unwrap()
    }

    #[test]
    fn test_linear_returns_history_plus_horizon() {
        let result = forecast(&cpk_series(), &ForecastRequest::default()).unwrap();
        assert_eq!(result.points.len(), 17);
        for (p, &v) in result.points[..10].iter().zip(CPK.iter()) {
            assert!(!p.is_forecast);
            assert_eq!(p.lower_bound, v);
            assert_eq!(p.upper_bound, v);
            assert_eq!(p.point_forecast, v);
        }
        assert!(result.points[10..].iter().all(|p| p.is_forecast));
    }

    #[test]
    fn test_linear_width_non_decreasing() {
        let result = forecast(&cpk_series(), &ForecastRequest::default()).unwrap();
        let widths: Vec<f64> = result.future().map(ForecastPoint::width).collect();
        for pair in widths.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn test_moving_average_width_constant() {
        let request = ForecastRequest::new(ForecastMethod::MovingAverage { window: 5 });
        let result = forecast(&cpk_series(), &request).unwrap();
        let widths: Vec<f64> = result.future().map(ForecastPoint::width).collect();
        assert_eq!(widths.len(), 7);
        assert!(widths.iter().all(|&w| (w - widths[0]).abs() < 1e-15));
    }

    #[test]
    fn test_short_history_is_empty_not_error() {
        let series = MeasurementSeries::from_values(&[1.3, 1.2]).unwrap();
        let result = forecast(&series, &ForecastRequest::default()).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_invalid_alpha_is_error() {
        let request = ForecastRequest::new(ForecastMethod::ExponentialSmoothing { alpha: 1.5 });
        assert!(forecast(&cpk_series(), &request).is_err());
    }

    #[test]
    fn test_future_dates_follow_history_spacing() {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let samples = (0..4)
            .map(|i| Sample::new(start + Duration::hours(8 * i), 1.3 + i as f64 * 0.01))
            .collect();
        let series = MeasurementSeries::new(samples).unwrap();
        let result = forecast(&series, &ForecastRequest::default().with_horizon(2)).unwrap();
        let future: Vec<&ForecastPoint> = result.future().collect();
        assert_eq!(future[0].date, start + Duration::hours(32));
        assert_eq!(future[1].date, start + Duration::hours(40));
    }

    #[test]
    fn test_same_timestamp_history_steps_one_day() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let samples = vec![
            Sample::new(t, 1.2),
            Sample::new(t, 1.3),
            Sample::new(t, 1.4),
        ];
        let series = MeasurementSeries::new(samples).unwrap();
        let result = forecast(&series, &ForecastRequest::default().with_horizon(1)).unwrap();
        assert_eq!(result.future().next().unwrap().date, t + Duration::days(1));
    }

    #[test]
    fn test_wider_confidence_gives_wider_band() {
        let base = ForecastRequest::new(ForecastMethod::WeightedMovingAverage);
        let narrow = forecast(&cpk_series(), &base.with_confidence(ConfidenceLevel::P90)).unwrap();
        let wide = forecast(&cpk_series(), &base.with_confidence(ConfidenceLevel::P99)).unwrap();
        let n: Vec<f64> = narrow.future().map(ForecastPoint::width).collect();
        let w: Vec<f64> = wide.future().map(ForecastPoint::width).collect();
        assert!(n.iter().zip(&w).all(|(a, b)| b > a));
    }

    #[test]
    fn test_request_serde() {
        let req: ForecastRequest =
            serde_json::from_str(r#"{"method":"moving_average","window":3,"horizon":14}"#)
                .unwrap();
        assert_eq!(req.method, ForecastMethod::MovingAverage { window: 3 });
        assert_eq!(req.horizon, 14);
        assert_eq!(req.confidence, ConfidenceLevel::P95);
    }
}
