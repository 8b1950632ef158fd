//! Threshold configuration and alert derivation.
//!
//! - [`ThresholdConfig`] — Cpk minimums, warning/critical spec limits,
//!   enabled rules and rule severities
//! - [`forecast_alerts`] — synthetic forecast points below a Cpk minimum
//! - [`rule_alerts`] — run-rule violations, severity by lookup
//! - [`limit_alerts`] — samples beyond warning/critical limits

mod event;
mod threshold;

pub use event::{forecast_alerts, limit_alerts, rule_alerts, AlertEvent, AlertSource};
pub use threshold::{RuleViolation, Severity, ThresholdConfig};
