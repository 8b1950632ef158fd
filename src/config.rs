//! Boundary conversion for externally stored thresholds.
//!
//! Threshold rows are persisted as integers scaled by 10000 (a Cpk minimum of
//! 1.33 is stored as 13300). [`StoredThresholds`] mirrors that row shape and
//! converts to and from [`ThresholdConfig`]. Nothing else in the crate works
//! in fixed point.
//!
//! # Examples
//!
//! ```
//! use spc_core::config::{from_fixed_point, thresholds_from_json, to_fixed_point};
//!
//! assert_eq!(to_fixed_point(1.33).unwrap(), 13300);
//! assert_eq!(from_fixed_point(13300), 1.33);
//!
//! let row = r#"{ "machineId": 7, "warningCpkMin": 13300, "criticalCpkMin": 10000 }"#;
//! let config = thresholds_from_json(row).unwrap();
//! assert_eq!(config.warning_cpk_min, Some(1.33));
//! assert_eq!(config.critical_cpk_min, Some(1.0));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::alert::{Severity, ThresholdConfig};
use crate::error::SpcError;
use crate::spc::RuleSet;

/// Fixed-point scale of stored thresholds.
pub const FIXED_POINT_SCALE: f64 = 10_000.0;

/// Scales a threshold for storage, rounding to the nearest integer.
///
/// # Errors
///
/// [`SpcError::InvalidParameter`] for non-finite values or values whose
/// scaled form does not fit in an `i64`.
pub fn to_fixed_point(value: f64) -> Result<i64, SpcError> {
    let scaled = (value * FIXED_POINT_SCALE).round();
    if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
        return Err(SpcError::InvalidParameter {
            name: "threshold",
            value,
        });
    }
    Ok(scaled as i64)
}

/// Recovers a threshold from its stored form.
pub fn from_fixed_point(stored: i64) -> f64 {
    stored as f64 / FIXED_POINT_SCALE
}

fn default_enabled() -> i64 {
    1
}

/// A persisted threshold row.
///
/// Unknown columns (ids, notification settings) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredThresholds {
    #[serde(default)]
    pub warning_usl: Option<i64>,
    #[serde(default)]
    pub warning_lsl: Option<i64>,
    #[serde(default)]
    pub warning_cpk_min: Option<i64>,
    #[serde(default)]
    pub critical_usl: Option<i64>,
    #[serde(default)]
    pub critical_lsl: Option<i64>,
    #[serde(default)]
    pub critical_cpk_min: Option<i64>,
    /// Non-zero enables all eight run rules.
    #[serde(default = "default_enabled")]
    pub enable_spc_rules: i64,
    #[serde(default)]
    pub spc_rule_severity: Severity,
}

impl Default for StoredThresholds {
    fn default() -> Self {
        Self {
            warning_usl: None,
            warning_lsl: None,
            warning_cpk_min: None,
            critical_usl: None,
            critical_lsl: None,
            critical_cpk_min: None,
            enable_spc_rules: default_enabled(),
            spc_rule_severity: Severity::Warning,
        }
    }
}

impl StoredThresholds {
    /// Column names that identify a stored row.
    const KEYS: [&'static str; 8] = [
        "warningUsl",
        "warningLsl",
        "warningCpkMin",
        "criticalUsl",
        "criticalLsl",
        "criticalCpkMin",
        "enableSpcRules",
        "spcRuleSeverity",
    ];

    /// Encodes a config for storage.
    ///
    /// Rule subsets other than "all" or "none" and per-rule overrides have no
    /// stored column; a non-empty rule set is stored as enabled.
    ///
    /// # Errors
    ///
    /// See [`to_fixed_point`].
    pub fn from_config(config: &ThresholdConfig) -> Result<Self, SpcError> {
        let encode = |v: Option<f64>| v.map(to_fixed_point).transpose();
        Ok(Self {
            warning_usl: encode(config.warning_usl)?,
            warning_lsl: encode(config.warning_lsl)?,
            warning_cpk_min: encode(config.warning_cpk_min)?,
            critical_usl: encode(config.critical_usl)?,
            critical_lsl: encode(config.critical_lsl)?,
            critical_cpk_min: encode(config.critical_cpk_min)?,
            enable_spc_rules: i64::from(!config.enabled_rules.is_empty()),
            spc_rule_severity: config.rule_severity,
        })
    }
}

impl From<StoredThresholds> for ThresholdConfig {
    fn from(row: StoredThresholds) -> Self {
        let decode = |v: Option<i64>| v.map(from_fixed_point);
        ThresholdConfig {
            warning_cpk_min: decode(row.warning_cpk_min),
            critical_cpk_min: decode(row.critical_cpk_min),
            warning_usl: decode(row.warning_usl),
            warning_lsl: decode(row.warning_lsl),
            critical_usl: decode(row.critical_usl),
            critical_lsl: decode(row.critical_lsl),
            enabled_rules: if row.enable_spc_rules != 0 {
                RuleSet::nelson()
            } else {
                RuleSet::empty()
            },
            rule_severity: row.spc_rule_severity,
            rule_severity_overrides: Default::default(),
        }
    }
}

/// Loads and validates a threshold config from JSON.
///
/// Accepts either a [`ThresholdConfig`] document or a stored row (detected
/// by its camelCase column names, values scaled by 10000).
///
/// # Errors
///
/// [`SpcError::Config`] for malformed JSON or inconsistent limits.
pub fn thresholds_from_json(json: &str) -> Result<ThresholdConfig, SpcError> {
    let value: Value = serde_json::from_str(json)?;
    let is_stored_row = value
        .as_object()
        .is_some_and(|obj| StoredThresholds::KEYS.iter().any(|k| obj.contains_key(*k)));

    let config = if is_stored_row {
        serde_json::from_value::<StoredThresholds>(value)?.into()
    } else {
        serde_json::from_value::<ThresholdConfig>(value)?
    };
    config.validate()?;
    Ok(config)
}
