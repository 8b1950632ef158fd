//! Incremental rule evaluation.

use std::collections::VecDeque;

use super::chart::{Rule, ViolationRecord};
use super::rules::RuleSet;

/// Streaming run-rule evaluator.
///
/// Holds only the last [`Rule::MAX_WINDOW`] standardized values. Feeding a
/// sequence one value at a time yields exactly the violations that
/// [`RunRule::check`](super::RunRule::check) reports for the whole sequence.
///
/// # Examples
///
/// ```
/// use spc_core::spc::{Rule, RuleSet, RuleWindow};
///
/// let mut window = RuleWindow::new(RuleSet::nelson());
/// assert!(window.push(0.4).is_empty());
/// let fired = window.push(3.4);
/// assert_eq!(fired[0].rule, Rule::BeyondLimits);
/// assert_eq!(fired[0].point_index, 1);
/// ```
#[derive(Debug, Clone)]
pub struct RuleWindow {
    rules: RuleSet,
    buffer: VecDeque<f64>,
    next_index: usize,
}

impl RuleWindow {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            buffer: VecDeque::with_capacity(Rule::MAX_WINDOW),
            next_index: 0,
        }
    }

    /// Appends one standardized value and returns the rules it triggers.
    pub fn push(&mut self, z: f64) -> Vec<ViolationRecord> {
        if self.buffer.len() == Rule::MAX_WINDOW {
            self.buffer.pop_front();
        }
        self.buffer.push_back(z);
        let point_index = self.next_index;
        self.next_index += 1;

        let history = self.buffer.make_contiguous();
        self.rules
            .evaluate_last(history)
            .map(|rule| ViolationRecord { point_index, rule })
            .collect()
    }

    /// Number of values pushed since creation or the last [`reset`](Self::reset).
    pub fn points_seen(&self) -> usize {
        self.next_index
    }

    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    /// Clears the buffer; the next value is point 0 again.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.next_index = 0;
    }
}
