//! Run rules for detecting non-random patterns in control charts.
//!
//! Every rule is a pure predicate over the trailing window of standardized
//! values ending at the point being evaluated. A rule never fires before its
//! window is full and never looks ahead, so batch evaluation over a whole
//! series and incremental evaluation point by point (see
//! [`RuleWindow`](super::RuleWindow)) report exactly the same violations.
//!
//! Rules operate on z-scores, so the same predicates apply to any chart whose
//! limits sit at CL ± 3σ.
//!
//! # References
//!
//! - Nelson, L.S. (1984). "The Shewhart Control Chart — Tests for Special Causes",
//!   *Journal of Quality Technology* 16(4), pp. 237-239.
//! - Western Electric (1956). *Statistical Quality Control Handbook*.
//! - Montgomery, D.C. (2019). *Introduction to Statistical Quality Control*, 8th ed.

use serde::{Deserialize, Serialize};

use super::chart::{Rule, ViolationRecord};
use crate::error::SpcError;

/// Trait for applying run rules to a standardized sequence.
///
/// Run rules detect non-random patterns that indicate special causes of
/// variation even when individual points remain within control limits.
pub trait RunRule {
    /// Checks every point of `z` and returns violations ordered by point
    /// index, then by rule id. A point appears once per rule it triggers.
    fn check(&self, z: &[f64]) -> Vec<ViolationRecord>;
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Evaluates `rule` on the trailing window ending at the last element of
/// `history`.
///
/// Returns `false` when `history` is shorter than the rule's window.
pub fn fires(rule: Rule, history: &[f64]) -> bool {
    let w = rule.window();
    if history.len() < w {
        return false;
    }
    let window = &history[history.len() - w..];
    match rule {
        Rule::BeyondLimits => window[0].abs() > 3.0,
        Rule::NineOneSide => one_side(window),
        Rule::SixTrend => monotonic(window),
        Rule::FourteenAlternating => alternating(window),
        Rule::TwoOfThreeBeyond2Sigma => count_one_side(window, 2.0) >= 2,
        Rule::FourOfFiveBeyond1Sigma => count_one_side(window, 1.0) >= 4,
        Rule::FifteenWithin1Sigma => window.iter().all(|z| z.abs() <= 1.0),
        Rule::EightBeyond1Sigma => window.iter().all(|z| z.abs() > 1.0),
    }
}

/// All strictly above or all strictly below the center line. A point exactly
/// on the center line belongs to neither side.
fn one_side(window: &[f64]) -> bool {
    window.iter().all(|&z| z > 0.0) || window.iter().all(|&z| z < 0.0)
}

/// Strictly increasing or strictly decreasing; ties break the run.
fn monotonic(window: &[f64]) -> bool {
    window.windows(2).all(|p| p[1] > p[0]) || window.windows(2).all(|p| p[1] < p[0])
}

/// Consecutive differences change sign at every step.
fn alternating(window: &[f64]) -> bool {
    window
        .windows(3)
        .all(|t| (t[1] - t[0]) * (t[2] - t[1]) < 0.0)
}

/// Larger of the counts beyond `+k` and beyond `-k`.
fn count_one_side(window: &[f64], k: f64) -> usize {
    let above = window.iter().filter(|&&z| z > k).count();
    let below = window.iter().filter(|&&z| z < -k).count();
    above.max(below)
}

// ---------------------------------------------------------------------------
// Rule sets
// ---------------------------------------------------------------------------

/// A set of enabled rules.
///
/// Serializes as a sorted list of rule ids, e.g. `[1, 2, 5, 6]`.
///
/// # Examples
///
/// ```
/// use spc_core::spc::{Rule, RuleSet, RunRule};
///
/// let rules = RuleSet::western_electric();
/// assert!(rules.contains(Rule::TwoOfThreeBeyond2Sigma));
/// assert!(!rules.contains(Rule::SixTrend));
///
/// let v = RuleSet::nelson().check(&[0.0, 3.5, 0.2]);
/// assert_eq!(v.len(), 1);
/// assert_eq!(v[0].point_index, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct RuleSet {
    mask: u8,
}

impl RuleSet {
    /// No rules enabled.
    pub const fn empty() -> Self {
        Self { mask: 0 }
    }

    /// All eight Nelson rules.
    pub const fn nelson() -> Self {
        Self { mask: 0xFF }
    }

    /// The four Western Electric rules: Nelson 1, 2, 5 and 6.
    pub fn western_electric() -> Self {
        [
            Rule::BeyondLimits,
            Rule::NineOneSide,
            Rule::TwoOfThreeBeyond2Sigma,
            Rule::FourOfFiveBeyond1Sigma,
        ]
        .into_iter()
        .collect()
    }

    /// Builds a set from rule ids.
    ///
    /// # Errors
    ///
    /// [`SpcError::Config`] if any id is outside `1..=8`.
    pub fn from_ids(ids: &[u8]) -> Result<Self, SpcError> {
        ids.iter()
            .map(|&id| Rule::try_from(id).map_err(SpcError::Config))
            .collect()
    }

    fn bit(rule: Rule) -> u8 {
        1 << (rule.id() - 1)
    }

    pub fn contains(&self, rule: Rule) -> bool {
        self.mask & Self::bit(rule) != 0
    }

    pub fn insert(&mut self, rule: Rule) {
        self.mask |= Self::bit(rule);
    }

    pub fn remove(&mut self, rule: Rule) {
        self.mask &= !Self::bit(rule);
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }

    /// Enabled rules in ascending id order.
    pub fn iter(self) -> impl Iterator<Item = Rule> {
        Rule::ALL.into_iter().filter(move |&r| self.contains(r))
    }

    /// Rules of this set that fire on the window ending at the last element
    /// of `history`.
    pub fn evaluate_last(self, history: &[f64]) -> impl Iterator<Item = Rule> + '_ {
        self.iter().filter(move |&rule| fires(rule, history))
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::nelson()
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut set = RuleSet::empty();
        for rule in iter {
            set.insert(rule);
        }
        set
    }
}

impl From<RuleSet> for Vec<u8> {
    fn from(set: RuleSet) -> Vec<u8> {
        set.iter().map(Rule::id).collect()
    }
}

impl TryFrom<Vec<u8>> for RuleSet {
    type Error = String;

    fn try_from(ids: Vec<u8>) -> Result<Self, Self::Error> {
        ids.into_iter().map(Rule::try_from).collect()
    }
}

impl RunRule for RuleSet {
    fn check(&self, z: &[f64]) -> Vec<ViolationRecord> {
        let mut violations = Vec::new();
        for end in 0..z.len() {
            let history = &z[..=end];
            for rule in self.iter() {
                if fires(rule, history) {
                    violations.push(ViolationRecord {
                        point_index: end,
                        rule,
                    });
                }
            }
        }
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules_at(violations: &[ViolationRecord], index: usize) -> Vec<Rule> {
        violations
            .iter()
            .filter(|v| v.point_index == index)
            .map(|v| v.rule)
            .collect()
    }

    fn only(rule: Rule) -> RuleSet {
        [rule].into_iter().collect()
    }

    // --- Rule 1: beyond 3σ ---

    #[test]
    fn test_rule1_beyond_limits() {
        let v = only(Rule::BeyondLimits).check(&[0.0, 3.2, -0.5, -4.0]);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].point_index, 1);
        assert_eq!(v[1].point_index, 3);
    }

    #[test]
    fn test_rule1_on_limit_is_not_violation() {
        assert!(only(Rule::BeyondLimits).check(&[3.0, -3.0]).is_empty());
    }

    // --- Rule 2: 9 on one side ---

    #[test]
    fn test_rule2_nine_above() {
        let z = [0.5; 9];
        let v = only(Rule::NineOneSide).check(&z);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].point_index, 8);
    }

    #[test]
    fn test_rule2_eight_not_enough() {
        assert!(only(Rule::NineOneSide).check(&[-0.5; 8]).is_empty());
    }

    #[test]
    fn test_rule2_center_line_breaks_run() {
        let mut z = vec![0.5; 10];
        z[4] = 0.0;
        assert!(only(Rule::NineOneSide).check(&z).is_empty());
    }

    #[test]
    fn test_rule2_continuation() {
        // Every point after the ninth extends the run and fires again.
        let v = only(Rule::NineOneSide).check(&[-0.3; 11]);
        let idx: Vec<usize> = v.iter().map(|r| r.point_index).collect();
        assert_eq!(idx, vec![8, 9, 10]);
    }

    // --- Rule 3: 6 trending ---

    #[test]
    fn test_rule3_six_increasing() {
        let z = [-1.0, -0.6, -0.2, 0.2, 0.6, 1.0];
        let v = only(Rule::SixTrend).check(&z);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].point_index, 5);
    }

    #[test]
    fn test_rule3_six_decreasing() {
        let z = [1.0, 0.6, 0.2, -0.2, -0.6, -1.0];
        assert_eq!(only(Rule::SixTrend).check(&z).len(), 1);
    }

    #[test]
    fn test_rule3_five_not_enough() {
        assert!(only(Rule::SixTrend)
            .check(&[0.0, 0.1, 0.2, 0.3, 0.4])
            .is_empty());
    }

    #[test]
    fn test_rule3_tie_breaks_trend() {
        let z = [0.0, 0.1, 0.2, 0.2, 0.3, 0.4];
        assert!(only(Rule::SixTrend).check(&z).is_empty());
    }

    // --- Rule 4: 14 alternating ---

    #[test]
    fn test_rule4_fourteen_alternating() {
        let z: Vec<f64> = (0..14).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        let v = only(Rule::FourteenAlternating).check(&z);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].point_index, 13);
    }

    #[test]
    fn test_rule4_thirteen_not_enough() {
        let z: Vec<f64> = (0..13).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        assert!(only(Rule::FourteenAlternating).check(&z).is_empty());
    }

    // --- Rule 5: 2 of 3 beyond 2σ ---

    #[test]
    fn test_rule5_two_of_three_above() {
        let v = only(Rule::TwoOfThreeBeyond2Sigma).check(&[2.5, 0.0, 2.1]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].point_index, 2);
    }

    #[test]
    fn test_rule5_not_triggered_mixed_sides() {
        assert!(only(Rule::TwoOfThreeBeyond2Sigma)
            .check(&[2.5, 0.0, -2.5])
            .is_empty());
    }

    // --- Rule 6: 4 of 5 beyond 1σ ---

    #[test]
    fn test_rule6_four_of_five_below() {
        let v = only(Rule::FourOfFiveBeyond1Sigma).check(&[-1.5, -1.2, 0.0, -1.1, -2.0]);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].point_index, 4);
    }

    // --- Rule 7: 15 within 1σ ---

    #[test]
    fn test_rule7_fifteen_within() {
        let z: Vec<f64> = (0..15).map(|i| -0.5 + (i % 3) as f64 * 0.25).collect();
        let v = only(Rule::FifteenWithin1Sigma).check(&z);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].point_index, 14);
    }

    #[test]
    fn test_rule7_fourteen_not_enough() {
        assert!(only(Rule::FifteenWithin1Sigma).check(&[0.1; 14]).is_empty());
    }

    // --- Rule 8: 8 beyond 1σ either side ---

    #[test]
    fn test_rule8_eight_beyond() {
        let z = [2.0, -2.0, 2.0, -2.0, 2.0, -2.0, 2.0, -2.0];
        let v = only(Rule::EightBeyond1Sigma).check(&z);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].point_index, 7);
    }

    #[test]
    fn test_rule8_seven_not_enough() {
        assert!(only(Rule::EightBeyond1Sigma)
            .check(&[2.0, -2.0, 2.0, -2.0, 2.0, -2.0, 2.0])
            .is_empty());
    }

    // --- Rule sets ---

    #[test]
    fn test_increasing_series_first_violation_is_trend() {
        // Linear ramp; standardized values keep the same ordering.
        let z: Vec<f64> = (0..10).map(|i| (i as f64 - 4.5) * 0.3).collect();
        let v = RuleSet::nelson().check(&z);
        let first = v.first().unwrap();
        assert_eq!(first.point_index, 5);
        assert_eq!(first.rule, Rule::SixTrend);
        assert!(rules_at(&v, 4).is_empty());
    }

    #[test]
    fn test_violations_ordered_by_index_then_rule() {
        let z = [3.5, 3.5, 3.5];
        let v = RuleSet::nelson().check(&z);
        for pair in v.windows(2) {
            assert!((pair[0].point_index, pair[0].rule) < (pair[1].point_index, pair[1].rule));
        }
        assert_eq!(rules_at(&v, 1), vec![Rule::BeyondLimits]);
        assert_eq!(
            rules_at(&v, 2),
            vec![Rule::BeyondLimits, Rule::TwoOfThreeBeyond2Sigma]
        );
    }

    #[test]
    fn test_disabled_rules_never_fire() {
        let z = [0.5; 9];
        assert!(RuleSet::empty().check(&z).is_empty());
        let mut set = RuleSet::nelson();
        set.remove(Rule::NineOneSide);
        assert!(set.check(&z).iter().all(|v| v.rule != Rule::NineOneSide));
    }

    #[test]
    fn test_western_electric_members() {
        let ids: Vec<u8> = RuleSet::western_electric().into();
        assert_eq!(ids, vec![1, 2, 5, 6]);
    }

    #[test]
    fn test_from_ids_rejects_unknown() {
        assert!(RuleSet::from_ids(&[1, 9]).is_err());
        assert_eq!(
            RuleSet::from_ids(&[3, 1]).unwrap(),
            [Rule::BeyondLimits, Rule::SixTrend]
                .into_iter()
                .collect::<RuleSet>()
        );
    }

    #[test]
    fn test_rule_set_serde() {
        let json = serde_json::to_string(&RuleSet::western_electric()).unwrap();
        assert_eq!(json, "[1,2,5,6]");
        let set: RuleSet = serde_json::from_str("[8,3]").unwrap();
        assert!(set.contains(Rule::SixTrend) && set.contains(Rule::EightBeyond1Sigma));
        assert!(serde_json::from_str::<RuleSet>("[0]").is_err());
    }

    #[test]
    fn test_evaluate_last_matches_check() {
        let z = [0.1, 0.4, 0.9, 1.3, 1.8, 2.4];
        let last: Vec<Rule> = RuleSet::nelson().evaluate_last(&z).collect();
        let batch = RuleSet::nelson().check(&z);
        assert_eq!(last, rules_at(&batch, 5));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn rule1_never_fires_within_limits(
            z in proptest::collection::vec(-3.0_f64..=3.0, 1..60),
        ) {
            prop_assert!(only_rule1().check(&z).is_empty());
        }

        #[test]
        fn no_rule_fires_before_its_window(
            z in proptest::collection::vec(-5.0_f64..5.0, 1..40),
        ) {
            for v in RuleSet::nelson().check(&z) {
                prop_assert!(v.point_index + 1 >= v.rule.window());
            }
        }

        #[test]
        fn prefix_results_are_stable(
            z in proptest::collection::vec(-5.0_f64..5.0, 2..40),
            cut in 1_usize..40,
        ) {
            // No look-ahead: appending points never changes earlier results.
            let cut = cut.min(z.len());
            let full = RuleSet::nelson().check(&z);
            let prefix = RuleSet::nelson().check(&z[..cut]);
            let full_prefix: Vec<_> = full.into_iter().filter(|v| v.point_index < cut).collect();
            prop_assert_eq!(prefix, full_prefix);
        }
    }

    fn only_rule1() -> RuleSet {
        [Rule::BeyondLimits].into_iter().collect()
    }
}
