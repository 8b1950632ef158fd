//! Statistical Process Control (SPC) charts.
//!
//! Control limits, sigma zones and run-rule detection for individual or
//! subgrouped measurement series.
//!
//! # Limits
//!
//! - [`ZoneAnalysis`] — limits at CL ± 3σ plus one standardized point per sample
//! - [`control_limits`] — limits only
//! - [`subgroup_limits`] — X-bar and R chart limits (A2, D3, D4) for subgrouped data
//!
//! # Run Rules
//!
//! - [`RuleSet::nelson`] — all 8 rules
//! - [`RuleSet::western_electric`] — rules 1, 2, 5, 6
//! - [`RuleWindow`] — incremental evaluation over the last 15 points
//!
//! # References
//!
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.
//! - ASTM E2587 — Standard Practice for Use of Control Charts
//! - Nelson, L.S. (1984). "The Shewhart Control Chart — Tests for Special Causes",
//!   *Journal of Quality Technology* 16(4), pp. 237-239.

mod chart;
mod limits;
mod rules;
mod window;

pub use chart::{
    ChartLimits, ControlLimits, Rule, Side, StandardizedPoint, SubgroupLimits, ViolationRecord,
    Zone, ZoneBoundaries,
};
pub use limits::{control_limits, subgroup_limits, ZoneAnalysis};
pub use rules::{fires, RuleSet, RunRule};
pub use window::RuleWindow;
