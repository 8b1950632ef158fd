//! Threshold configuration supplied by the caller on every evaluation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SpcError;
use crate::spc::{Rule, RuleSet, ViolationRecord};

/// Alert severity. Orders `Warning < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        })
    }
}

/// Warning and critical limits for one monitored series.
///
/// Every limit is optional; `None` means "not configured" and disables that
/// check. It is never treated as zero.
///
/// # Examples
///
/// ```
/// use spc_core::alert::{Severity, ThresholdConfig};
/// use spc_core::spc::Rule;
///
/// let json = r#"{
///     "warning_cpk_min": 1.33,
///     "critical_cpk_min": 1.0,
///     "enabled_rules": [1, 2, 3],
///     "rule_severity_overrides": { "1": "critical" }
/// }"#;
/// let config: ThresholdConfig = serde_json::from_str(json).unwrap();
/// assert_eq!(config.severity_for(Rule::BeyondLimits), Severity::Critical);
/// assert_eq!(config.severity_for(Rule::SixTrend), Severity::Warning);
/// assert!(config.warning_usl.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    pub warning_cpk_min: Option<f64>,
    pub critical_cpk_min: Option<f64>,
    pub warning_usl: Option<f64>,
    pub warning_lsl: Option<f64>,
    pub critical_usl: Option<f64>,
    pub critical_lsl: Option<f64>,
    /// Rules evaluated for this series. All eight by default.
    pub enabled_rules: RuleSet,
    /// Severity of a rule violation without an override.
    pub rule_severity: Severity,
    pub rule_severity_overrides: BTreeMap<Rule, Severity>,
}

impl ThresholdConfig {
    /// Severity assigned to violations of `rule`.
    pub fn severity_for(&self, rule: Rule) -> Severity {
        self.rule_severity_overrides
            .get(&rule)
            .copied()
            .unwrap_or(self.rule_severity)
    }

    /// Attaches severities to violations of enabled rules; violations of
    /// disabled rules are dropped.
    pub fn classify(&self, violations: &[ViolationRecord]) -> Vec<RuleViolation> {
        violations
            .iter()
            .filter(|v| self.enabled_rules.contains(v.rule))
            .map(|v| RuleViolation {
                point_index: v.point_index,
                rule: v.rule,
                severity: self.severity_for(v.rule),
            })
            .collect()
    }

    /// Checks that configured limits are finite and consistently ordered.
    ///
    /// # Errors
    ///
    /// [`SpcError::Config`] when a limit is non-finite, the critical Cpk
    /// minimum exceeds the warning minimum, a critical spec limit sits inside
    /// its warning limit, or an upper limit is not above its lower limit.
    pub fn validate(&self) -> Result<(), SpcError> {
        let fields = [
            ("warning_cpk_min", self.warning_cpk_min),
            ("critical_cpk_min", self.critical_cpk_min),
            ("warning_usl", self.warning_usl),
            ("warning_lsl", self.warning_lsl),
            ("critical_usl", self.critical_usl),
            ("critical_lsl", self.critical_lsl),
        ];
        for (name, value) in fields {
            if let Some(v) = value.filter(|v| !v.is_finite()) {
                return Err(SpcError::Config(format!("{name} is not finite: {v}")));
            }
        }
        let ordered = |lo: Option<f64>, hi: Option<f64>| match (lo, hi) {
            (Some(lo), Some(hi)) => lo <= hi,
            _ => true,
        };
        if !ordered(self.critical_cpk_min, self.warning_cpk_min) {
            return Err(SpcError::Config(
                "critical_cpk_min must not exceed warning_cpk_min".into(),
            ));
        }
        if !ordered(self.warning_usl, self.critical_usl)
            || !ordered(self.critical_lsl, self.warning_lsl)
        {
            return Err(SpcError::Config(
                "critical limits must lie outside warning limits".into(),
            ));
        }
        if !ordered(self.warning_lsl, self.warning_usl)
            || !ordered(self.critical_lsl, self.critical_usl)
        {
            return Err(SpcError::Config("lower limit above upper limit".into()));
        }
        Ok(())
    }
}

/// A violation record with its configured severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleViolation {
    pub point_index: usize,
    pub rule: Rule,
    pub severity: Severity,
}
