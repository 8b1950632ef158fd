//! Error types.
//!
//! Two kinds of failure are kept apart:
//!
//! - [`SpcError`] — hard errors. Invalid input reached the core (non-finite
//!   values, unordered timestamps, out-of-range parameters) and the call is
//!   refused.
//! - [`Unavailable`] — signaled results. The input is valid but statistically
//!   degenerate (too few points, zero spread). These are normal, displayable
//!   outcomes and must be rendered as "not available", never as zero.

use thiserror::Error;

/// Hard errors returned by constructors and configuration loaders.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpcError {
    /// A measurement series must contain at least one sample.
    #[error("measurement series is empty")]
    EmptySeries,

    /// A sample value was NaN or infinite.
    #[error("sample {index} has non-finite value {value}")]
    NonFiniteValue { index: usize, value: f64 },

    /// A sample timestamp precedes the one before it.
    #[error("sample {index} is earlier than its predecessor")]
    UnorderedTimestamp { index: usize },

    /// Subgroup size outside the supported 1..=10 range.
    #[error("subgroup size must be 1..=10, got {0}")]
    InvalidSubgroupSize(usize),

    /// Specification limits are inconsistent.
    #[error("invalid specification limits: {0}")]
    InvalidSpecLimits(&'static str),

    /// A method parameter is out of range.
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// A configuration document could not be decoded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for SpcError {
    fn from(err: serde_json::Error) -> Self {
        SpcError::Config(err.to_string())
    }
}

/// Why a derived statistic could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unavailable {
    /// Not enough samples (or complete subgroups) for the estimator.
    #[error("insufficient data")]
    InsufficientData,
    /// The estimated sigma is exactly zero.
    #[error("zero variance")]
    ZeroVariance,
}
