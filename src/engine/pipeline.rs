//! One evaluation of one series snapshot.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::alert::{
    forecast_alerts, limit_alerts, rule_alerts, AlertEvent, RuleViolation, Severity,
    ThresholdConfig,
};
use crate::capability::{
    cpk_by_period, CapabilityFlag, CapabilityGrade, CapabilityIndices, Period, SpecLimits,
};
use crate::error::{SpcError, Unavailable};
use crate::forecast::{forecast, Forecast, ForecastRequest, TrendSummary};
use crate::series::MeasurementSeries;
use crate::spc::{RunRule, ZoneAnalysis};

/// Identifies one monitored series: a measurement on a machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub machine: String,
    pub measurement: String,
}

impl SeriesKey {
    pub fn new(machine: impl Into<String>, measurement: impl Into<String>) -> Self {
        Self {
            machine: machine.into(),
            measurement: measurement.into(),
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.machine, self.measurement)
    }
}

/// Everything needed to evaluate one series snapshot.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub key: SeriesKey,
    /// Frozen measurement snapshot.
    pub series: MeasurementSeries,
    pub spec: SpecLimits,
    pub thresholds: ThresholdConfig,
    /// Realized Cpk per period. When absent it is derived from `series`
    /// by bucketing on `cpk_period`.
    pub cpk_history: Option<MeasurementSeries>,
    /// Bucket size used to derive Cpk history from `series`.
    pub cpk_period: Period,
    pub forecast: ForecastRequest,
}

impl EvaluationRequest {
    pub fn new(key: SeriesKey, series: MeasurementSeries, spec: SpecLimits) -> Self {
        Self {
            key,
            series,
            spec,
            thresholds: ThresholdConfig::default(),
            cpk_history: None,
            cpk_period: Period::default(),
            forecast: ForecastRequest::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Derives Cpk history per `period` instead of per day.
    pub fn with_cpk_period(mut self, period: Period, request: ForecastRequest) -> Self {
        self.cpk_period = period;
        self.forecast = request;
        self
    }

    pub fn with_cpk_history(
        mut self,
        history: MeasurementSeries,
        request: ForecastRequest,
    ) -> Self {
        self.cpk_history = Some(history);
        self.forecast = request;
        self
    }
}

/// Result of one evaluation. Built fresh each time; nothing is carried over.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub key: SeriesKey,
    pub capability: CapabilityIndices,
    /// Cpk grade after accounting for rule violations.
    pub grade: CapabilityGrade,
    /// Limits and standardized points, or why they are unavailable.
    pub zones: Result<ZoneAnalysis, Unavailable>,
    pub violations: Vec<RuleViolation>,
    pub forecast: Option<Forecast>,
    pub trend: Option<TrendSummary>,
    /// Rule, limit and forecast alerts, in that order.
    pub alerts: Vec<AlertEvent>,
}

/// Runs capability, control limits, run rules, forecasting and alerting
/// over one snapshot.
///
/// # Errors
///
/// - [`SpcError::Config`] if the thresholds are inconsistent
/// - [`SpcError::InvalidParameter`] if the forecast method parameters are invalid
///
/// Degenerate data is not an error: it shows up as capability flags, an
/// unavailable zone analysis or an empty forecast.
///
/// Without an explicit Cpk history the forecast runs on the realized Cpk of
/// each `cpk_period` bucket of the series itself.
///
/// # Examples
///
/// ```
/// use spc_core::capability::SpecLimits;
/// use spc_core::engine::{evaluate, EvaluationRequest, SeriesKey};
/// use spc_core::series::MeasurementSeries;
///
/// let series = MeasurementSeries::from_values(&[
///     25.01, 24.98, 25.02, 25.00, 24.99, 25.03, 24.97, 25.01, 25.00, 24.99,
/// ]).unwrap();
/// let spec = SpecLimits::new(Some(25.10), Some(24.90)).unwrap();
/// let request = EvaluationRequest::new(SeriesKey::new("m-01", "bore"), series, spec);
/// let report = evaluate(&request).unwrap();
/// assert!(report.capability.cpk.is_some());
/// assert!(report.zones.is_ok());
/// ```
pub fn evaluate(request: &EvaluationRequest) -> Result<EvaluationReport, SpcError> {
    request.thresholds.validate()?;
    request.forecast.method.validate()?;
    let key = &request.key;
    let series = &request.series;

    let capability = request.spec.compute(series);
    for flag in &capability.flags {
        match flag {
            CapabilityFlag::ZeroVariance => {
                warn!(%key, "zero variance, capability indices unavailable")
            }
            CapabilityFlag::InsufficientData => {
                debug!(%key, len = series.len(), "insufficient data for capability")
            }
            CapabilityFlag::MissingSpecLimit => debug!(%key, "spec limit missing"),
        }
    }

    let zones = ZoneAnalysis::from_series(series);
    let records = match &zones {
        Ok(zones) => request.thresholds.enabled_rules.check(&zones.z_scores()),
        Err(reason) => {
            debug!(%key, %reason, "control limits unavailable, skipping run rules");
            Vec::new()
        }
    };
    let violations = request.thresholds.classify(&records);
    let grade = adjust_grade(CapabilityGrade::from_cpk(capability.cpk), &violations);

    let derived;
    let cpk_history = match &request.cpk_history {
        Some(history) => Some(history),
        None => {
            derived = cpk_by_period(series, &request.spec, request.cpk_period)?;
            if let Some(history) = &derived {
                debug!(%key, period = ?request.cpk_period, len = history.len(), "derived cpk history");
            }
            derived.as_ref()
        }
    };
    let (forecast, trend) = match cpk_history {
        Some(history) => {
            let result = forecast(history, &request.forecast)?;
            if result.is_empty() {
                debug!(%key, len = history.len(), "cpk history too short to forecast");
            }
            (Some(result), TrendSummary::from_values(history.values()))
        }
        None => (None, None),
    };

    let mut alerts = rule_alerts(series, &records, &request.thresholds);
    alerts.extend(limit_alerts(series, &request.thresholds));
    if let Some(result) = &forecast {
        alerts.extend(forecast_alerts(result, &request.thresholds));
    }
    debug!(
        %key,
        violations = violations.len(),
        alerts = alerts.len(),
        %grade,
        "evaluation finished"
    );

    Ok(EvaluationReport {
        key: key.clone(),
        capability,
        grade,
        zones,
        violations,
        forecast,
        trend,
        alerts,
    })
}

/// One step down for any violation; `Critical` for any critical violation.
/// `NotAvailable` stays as is.
pub fn adjust_grade(grade: CapabilityGrade, violations: &[RuleViolation]) -> CapabilityGrade {
    if grade == CapabilityGrade::NotAvailable {
        return grade;
    }
    match violations.iter().map(|v| v.severity).max() {
        Some(Severity::Critical) => CapabilityGrade::Critical,
        Some(Severity::Warning) => grade.downgraded(),
        None => grade,
    }
}
