//! Evaluation pipeline and concurrency boundary.
//!
//! - [`evaluate`] — capability, limits, rules, forecast and alerts for one
//!   frozen snapshot
//! - [`Coordinator`] — at most one evaluation in flight per [`SeriesKey`],
//!   newer snapshots coalesced
//! - [`evaluate_many`] — independent series evaluated in parallel

mod coordinator;
mod parallel;
mod pipeline;

pub use coordinator::{Admission, Coordinator, Ticket};
pub use parallel::evaluate_many;
pub use pipeline::{adjust_grade, evaluate, EvaluationReport, EvaluationRequest, SeriesKey};
