//! # spc-core
//!
//! Process capability, control-chart run rules, and Cpk forecasting with
//! threshold alerts for time-ordered production measurements.
//!
//! The crate answers three questions about a measurement series: is the
//! process capable of meeting its specification, is it currently out of
//! statistical control, and where is its Cpk headed. It works on plain
//! `f64` samples and knows nothing about storage, transport or UI.
//!
//! ## Modules
//!
//! - [`series`] — Validated, time-ordered measurement snapshots
//! - [`capability`] — Cp, Cpk, Pp, Ppk, Ca, Cpm, capability grade and Cpk per period
//! - [`spc`] — Control limits, X-bar/R limits, sigma zones and the eight Nelson run rules
//! - [`regression`] — Least-squares line fit used by forecasting
//! - [`forecast`] — Linear, moving-average, exponential and weighted forecasts
//! - [`alert`] — Threshold configuration and alert derivation
//! - [`config`] — Fixed-point threshold storage boundary
//! - [`engine`] — Evaluation pipeline, single-flight coordination, parallel runs
//!
//! ## Design Philosophy
//!
//! - **Fail fast on bad input**: non-finite or unordered samples are rejected
//!   when a series is built
//! - **Degenerate is not an error**: too little data or zero spread yields
//!   `None` and a flag, never a misleading zero
//! - **Immutable snapshots**: every evaluation reads a frozen series

pub mod alert;
pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod regression;
pub mod series;
pub mod spc;

pub use error::{SpcError, Unavailable};
