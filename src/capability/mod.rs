//! Process capability analysis.
//!
//! Computes standard capability indices for assessing how well a process
//! meets specification limits.
//!
//! # Indices
//!
//! - **Cp** — Potential capability (spread vs tolerance)
//! - **Cpk** — Actual capability (centering considered)
//! - **Pp**, **Ppk** — Long-term performance indices
//! - **Ca** — Accuracy (mean offset from target, relative to half tolerance)
//! - **Cpm** — Taguchi capability (target deviation)
//!
//! # Realized capability over time
//!
//! - [`capability_by_period`] / [`cpk_by_period`] — indices per shift, day, week or month
//!
//! # Sigma estimators
//!
//! - [`within_sigma`] — MR-bar/1.128 for individuals, R-bar/d2 for subgroups
//! - [`overall_sigma`] — population standard deviation
//!
//! # References
//!
//! - Montgomery (2019), *Introduction to Statistical Quality Control*, 8th ed.

mod grade;
mod indices;
mod period;
mod sigma;

pub use grade::CapabilityGrade;
pub use indices::{CapabilityFlag, CapabilityIndices, SpecLimits};
pub use period::{capability_by_period, cpk_by_period, Period, PeriodCapability, Shift};
pub use sigma::{d2, moving_range_sigma, overall_sigma, within_sigma, D2_MOVING_RANGE};
