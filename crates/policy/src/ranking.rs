//! Deterministic rule ordering.
//!
//! Precedence: priority descending, then execution order ascending, then id
//! descending. The id tie-break means a later-created rule outranks an older
//! one with identical priority and order, since ids grow monotonically.

use std::cmp::Ordering;
use std::ops::RangeInclusive;

use crate::model::PolicyRule;

/// Total precedence order over rules. Stable for any input because the id
/// comparison never ties for distinct rules.
pub fn precedence(a: &PolicyRule, b: &PolicyRule) -> Ordering {
    b.rule_priority
        .cmp(&a.rule_priority)
        .then_with(|| a.execution_order.cmp(&b.execution_order))
        .then_with(|| b.id.cmp(&a.id))
}

/// Sorts rules in place into evaluation order.
pub fn rank(rules: &mut [PolicyRule]) {
    rules.sort_by(precedence);
}

/// Keeps only rules whose execution order falls in `range` (inclusive both
/// ends), then ranks the survivors.
pub fn filter_by_execution_order(rules: &mut Vec<PolicyRule>, range: RangeInclusive<i32>) {
    rules.retain(|r| range.contains(&r.execution_order));
    rank(rules);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PolicyRule;
    use gridgate_core::{ProjectId, RuleId};

    fn rule(id: u64, priority: i32, order: i32) -> PolicyRule {
        let mut r = PolicyRule::new(ProjectId(1), format!("rule-{id}"));
        r.id = RuleId(id);
        r.rule_priority = priority;
        r.execution_order = order;
        r
    }

    #[test]
    fn priority_desc_then_order_asc() {
        let mut rules = vec![rule(1, 80, 2), rule(2, 80, 1), rule(3, 90, 5)];
        rank(&mut rules);
        let ids: Vec<u64> = rules.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn id_desc_breaks_full_ties() {
        let mut rules = vec![rule(1, 50, 0), rule(2, 50, 0), rule(3, 50, 0)];
        rank(&mut rules);
        let ids: Vec<u64> = rules.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn range_query_is_inclusive_and_ranked() {
        let mut rules = vec![rule(1, 50, 0), rule(2, 60, 5), rule(3, 70, 10), rule(4, 40, 11)];
        filter_by_execution_order(&mut rules, 5..=10);
        let ids: Vec<u64> = rules.iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}
