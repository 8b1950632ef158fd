//! Alert events derived from forecasts, rule violations and limit breaches.
//!
//! Events are produced fresh on every evaluation and never deduplicated
//! here; repeat suppression and escalation timers belong to whoever
//! delivers them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::threshold::{Severity, ThresholdConfig};
use crate::forecast::Forecast;
use crate::series::MeasurementSeries;
use crate::spc::{Rule, ViolationRecord};

/// What raised an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "rule", rename_all = "snake_case")]
pub enum AlertSource {
    /// A synthetic forecast point fell below a Cpk minimum.
    Forecast,
    /// A run rule fired.
    Rule(Rule),
    /// A sample crossed a warning or critical spec limit.
    Limit,
}

/// One alert, carrying only the numeric facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: Severity,
    pub source: AlertSource,
    pub message: String,
    pub at_date: DateTime<Utc>,
    /// Forecast value or sample value that triggered the alert.
    pub value: f64,
    /// Threshold that was crossed, if the alert has one.
    pub threshold: Option<f64>,
    /// Index of the triggering sample; `None` for forecast alerts.
    pub point_index: Option<usize>,
}

/// Alerts for synthetic forecast points below the Cpk minimums.
///
/// A point under `critical_cpk_min` raises a critical event; otherwise a
/// point under `warning_cpk_min` raises a warning. Historical points never
/// raise forecast alerts.
///
/// # Examples
///
/// ```
/// use spc_core::alert::{forecast_alerts, Severity, ThresholdConfig};
/// use spc_core::forecast::{forecast, ForecastRequest};
/// use spc_core::series::MeasurementSeries;
///
/// let cpk = [1.50, 1.45, 1.40, 1.35, 1.30, 1.25];
/// let series = MeasurementSeries::from_values(&cpk).unwrap();
/// let result = forecast(&series, &ForecastRequest::default()).unwrap();
/// let config = ThresholdConfig {
///     warning_cpk_min: Some(1.33),
///     critical_cpk_min: Some(1.0),
///     ..ThresholdConfig::default()
/// };
/// let alerts = forecast_alerts(&result, &config);
/// assert!(alerts.iter().any(|a| a.kind == Severity::Critical));
/// assert!(alerts.iter().all(|a| a.value < 1.33));
/// ```
pub fn forecast_alerts(forecast: &Forecast, config: &ThresholdConfig) -> Vec<AlertEvent> {
    forecast
        .future()
        .filter_map(|p| {
            let (kind, threshold) = below(p.point_forecast, config)?;
            Some(AlertEvent {
                kind,
                source: AlertSource::Forecast,
                message: format!(
                    "forecast Cpk {:.3} below {kind} minimum {threshold}",
                    p.point_forecast
                ),
                at_date: p.date,
                value: p.point_forecast,
                threshold: Some(threshold),
                point_index: None,
            })
        })
        .collect()
}

fn below(value: f64, config: &ThresholdConfig) -> Option<(Severity, f64)> {
    if let Some(t) = config.critical_cpk_min.filter(|&t| value < t) {
        return Some((Severity::Critical, t));
    }
    config
        .warning_cpk_min
        .filter(|&t| value < t)
        .map(|t| (Severity::Warning, t))
}

/// Alerts for rule violations of enabled rules, with severity taken from the
/// configuration.
///
/// Records pointing past the end of `series` are ignored.
pub fn rule_alerts(
    series: &MeasurementSeries,
    violations: &[ViolationRecord],
    config: &ThresholdConfig,
) -> Vec<AlertEvent> {
    let samples = series.samples();
    config
        .classify(violations)
        .into_iter()
        .filter_map(|v| {
            let sample = samples.get(v.point_index)?;
            Some(AlertEvent {
                kind: v.severity,
                source: AlertSource::Rule(v.rule),
                message: format!("{} at point {}", v.rule, v.point_index),
                at_date: sample.timestamp,
                value: sample.value,
                threshold: None,
                point_index: Some(v.point_index),
            })
        })
        .collect()
}

/// Alerts for samples outside the configured warning or critical limits.
///
/// Critical limits are checked first; a sample raises at most one event.
pub fn limit_alerts(series: &MeasurementSeries, config: &ThresholdConfig) -> Vec<AlertEvent> {
    series
        .samples()
        .iter()
        .enumerate()
        .filter_map(|(index, sample)| {
            let x = sample.value;
            let (kind, threshold, side) = breach(x, config.critical_usl, config.critical_lsl)
                .map(|(t, side)| (Severity::Critical, t, side))
                .or_else(|| {
                    breach(x, config.warning_usl, config.warning_lsl)
                        .map(|(t, side)| (Severity::Warning, t, side))
                })?;
            Some(AlertEvent {
                kind,
                source: AlertSource::Limit,
                message: format!("sample {x} {side} {kind} limit {threshold}"),
                at_date: sample.timestamp,
                value: x,
                threshold: Some(threshold),
                point_index: Some(index),
            })
        })
        .collect()
}

fn breach(x: f64, usl: Option<f64>, lsl: Option<f64>) -> Option<(f64, &'static str)> {
    if let Some(u) = usl.filter(|&u| x > u) {
        return Some((u, "above"));
    }
    lsl.filter(|&l| x < l).map(|l| (l, "below"))
}
