//! Evaluating many independent series at once.

use rayon::prelude::*;

use super::pipeline::{evaluate, EvaluationReport, EvaluationRequest};
use crate::error::SpcError;

/// Evaluates independent series in parallel.
///
/// Results keep the order of `requests`. Series share no state, so one
/// failing request does not affect the others.
pub fn evaluate_many(requests: &[EvaluationRequest]) -> Vec<Result<EvaluationReport, SpcError>> {
    requests.par_iter().map(evaluate).collect()
}
