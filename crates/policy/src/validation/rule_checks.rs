//! Policy-rule validation: ordered hard checks plus the non-blocking
//! completeness warning for active rules.

use gridgate_core::ActionId;

use super::ValidationResult;
use crate::model::{
    Action, Node, PolicyRule, ProtocolFilter, Trigger, MAX_NAME_LEN, MAX_RULE_PRIORITY,
    MIN_RULE_PRIORITY,
};

/// References resolved by the engine before validation. `None` for a set id
/// means the reference is dangling, which is itself a hard failure.
pub struct RuleValidationContext {
    pub project_exists: bool,
    pub source: Option<Node>,
    pub destination: Option<Node>,
    pub trigger: Option<Trigger>,
    pub actions: Vec<(ActionId, Option<Action>)>,
    pub filter: Option<ProtocolFilter>,
    /// Parent node of the referenced filter, if both resolve.
    pub filter_parent: Option<Node>,
    /// `(id, name)` of every rule already in the project, including this one.
    pub sibling_names: Vec<(gridgate_core::RuleId, String)>,
}

/// Run all rule checks in order. Errors block the save; warnings do not.
pub fn validate_rule(rule: &PolicyRule, ctx: &RuleValidationContext) -> ValidationResult {
    let mut result = ValidationResult::new();
    check_required_fields(rule, ctx, &mut result);
    check_priority_and_order(rule, &mut result);
    check_node_references(rule, ctx, &mut result);
    check_component_projects(rule, ctx, &mut result);
    check_filter_ownership(rule, ctx, &mut result);
    check_unique_name(rule, ctx, &mut result);
    check_completeness(rule, &mut result);
    check_feedback_loop(ctx, &mut result);
    result
}

fn check_required_fields(rule: &PolicyRule, ctx: &RuleValidationContext, result: &mut ValidationResult) {
    if rule.name.trim().is_empty() {
        result.error("name", "name is required");
    }
    if rule.name.chars().count() > MAX_NAME_LEN {
        result.error(
            "name",
            format!("name exceeds maximum length of {MAX_NAME_LEN} characters"),
        );
    }
    if !ctx.project_exists {
        result.error("project", format!("project {} does not exist", rule.project));
    }
}

fn check_priority_and_order(rule: &PolicyRule, result: &mut ValidationResult) {
    if rule.rule_priority < MIN_RULE_PRIORITY || rule.rule_priority > MAX_RULE_PRIORITY {
        result.error(
            "rulePriority",
            format!(
                "rule priority must be between {MIN_RULE_PRIORITY} and {MAX_RULE_PRIORITY}, got {}",
                rule.rule_priority
            ),
        );
    }
    if rule.execution_order < 0 {
        result.error(
            "executionOrder",
            format!("execution order must be non-negative, got {}", rule.execution_order),
        );
    }
}

fn check_node_references(rule: &PolicyRule, ctx: &RuleValidationContext, result: &mut ValidationResult) {
    if let Some(id) = rule.source_node {
        if ctx.source.is_none() {
            result.error("sourceNode", format!("references unknown node {id}"));
        }
    }
    if let Some(id) = rule.destination_node {
        if ctx.destination.is_none() {
            result.error("destinationNode", format!("references unknown node {id}"));
        }
    }
    if let (Some(src), Some(dst)) = (rule.source_node, rule.destination_node) {
        if src == dst {
            result.error(
                "sourceNode",
                "source node and destination node cannot be the same",
            );
        }
    }
    for (path, node) in [("sourceNode", &ctx.source), ("destinationNode", &ctx.destination)] {
        if let Some(node) = node {
            if node.project != rule.project {
                result.error(
                    path,
                    format!(
                        "node '{}' belongs to project {} but the rule belongs to project {}",
                        node.name, node.project, rule.project
                    ),
                );
            }
        }
    }
}

fn check_component_projects(rule: &PolicyRule, ctx: &RuleValidationContext, result: &mut ValidationResult) {
    if let Some(id) = rule.trigger {
        match &ctx.trigger {
            None => result.error("trigger", format!("references unknown trigger {id}")),
            Some(trigger) if trigger.project != rule.project => {
                result.error(
                    "trigger",
                    format!(
                        "trigger '{}' belongs to project {} but the rule belongs to project {}",
                        trigger.name, trigger.project, rule.project
                    ),
                );
            }
            Some(_) => {}
        }
    }
    for (id, action) in &ctx.actions {
        match action {
            None => result.error("actions", format!("references unknown action {id}")),
            Some(action) if action.project != rule.project => {
                result.error(
                    "actions",
                    format!(
                        "action '{}' belongs to project {} but the rule belongs to project {}",
                        action.name, action.project, rule.project
                    ),
                );
            }
            Some(_) => {}
        }
    }
}

fn check_filter_ownership(rule: &PolicyRule, ctx: &RuleValidationContext, result: &mut ValidationResult) {
    let Some(filter_id) = rule.filter else {
        return;
    };
    let Some(filter) = &ctx.filter else {
        result.error("filter", format!("references unknown filter {filter_id}"));
        return;
    };
    let Some(parent) = &ctx.filter_parent else {
        result.error(
            "filter.parentNode",
            format!(
                "filter '{}' has no resolvable parent node; a rule filter must be owned by the rule's source node",
                filter.name
            ),
        );
        return;
    };
    if parent.project != rule.project {
        result.error(
            "filter.parentNode",
            format!(
                "filter '{}' is owned by node '{}' in project {} but the rule belongs to project {}",
                filter.name, parent.name, parent.project, rule.project
            ),
        );
    }
    match rule.source_node {
        None => {
            result.error(
                "filter",
                format!(
                    "filter '{}' requires a source node: a rule filter must be owned by the rule's source node",
                    filter.name
                ),
            );
        }
        Some(source_id) if source_id != filter.parent_node => {
            result.error(
                "filter",
                format!(
                    "filter '{}' is owned by node '{}' but the rule's source node is {}",
                    filter.name, parent.name, source_id
                ),
            );
        }
        Some(_) => {}
    }
}

fn check_unique_name(rule: &PolicyRule, ctx: &RuleValidationContext, result: &mut ValidationResult) {
    let name = rule.name.to_lowercase();
    let duplicate = ctx
        .sibling_names
        .iter()
        .any(|(id, existing)| *id != rule.id && existing.to_lowercase() == name);
    if duplicate {
        result.error(
            "name",
            format!("rule name '{}' already exists in the project", rule.name),
        );
    }
}

/// Soft check: active rules missing components are saved with a warning so
/// operators can iterate on partially-specified rules.
fn check_completeness(rule: &PolicyRule, result: &mut ValidationResult) {
    if !rule.active {
        return;
    }
    let missing = rule.missing_components();
    if !missing.is_empty() {
        result.warn(
            "completeness",
            format!(
                "active rule is incomplete and cannot execute yet; missing: {}",
                missing.join(", ")
            ),
        );
    }
}

/// Advisory: a trigger sharing a name with one of the rule's actions is a
/// likely feedback loop.
fn check_feedback_loop(ctx: &RuleValidationContext, result: &mut ValidationResult) {
    let Some(trigger) = &ctx.trigger else {
        return;
    };
    for (_, action) in &ctx.actions {
        if let Some(action) = action {
            if action.name.eq_ignore_ascii_case(&trigger.name) {
                result.warn(
                    "trigger",
                    format!(
                        "trigger '{}' and action '{}' share a name; this may create a feedback loop",
                        trigger.name, action.name
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeConfig;
    use gridgate_core::{NodeId, ProjectId, TriggerId};

    fn node(id: u64, project: u64, name: &str) -> Node {
        let mut n = Node::new(
            ProjectId(project),
            name,
            NodeConfig::Can {
                interface: "can0".to_string(),
                bitrate: 500_000,
            },
        );
        n.id = NodeId(id);
        n
    }

    fn empty_ctx() -> RuleValidationContext {
        RuleValidationContext {
            project_exists: true,
            source: None,
            destination: None,
            trigger: None,
            actions: Vec::new(),
            filter: None,
            filter_parent: None,
            sibling_names: Vec::new(),
        }
    }

    #[test]
    fn same_source_and_destination_is_rejected() {
        let mut rule = PolicyRule::new(ProjectId(1), "loop");
        rule.source_node = Some(NodeId(1));
        rule.destination_node = Some(NodeId(1));
        let mut ctx = empty_ctx();
        ctx.source = Some(node(1, 1, "bus"));
        ctx.destination = Some(node(1, 1, "bus"));
        let result = validate_rule(&rule, &ctx);
        assert!(!result.valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("cannot be the same")));
    }

    #[test]
    fn node_from_another_project_is_rejected() {
        let mut rule = PolicyRule::new(ProjectId(1), "cross");
        rule.source_node = Some(NodeId(1));
        let mut ctx = empty_ctx();
        ctx.source = Some(node(1, 2, "foreign"));
        let result = validate_rule(&rule, &ctx);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "sourceNode"));
    }

    #[test]
    fn dangling_trigger_reference_is_rejected() {
        let mut rule = PolicyRule::new(ProjectId(1), "r");
        rule.trigger = Some(TriggerId(42));
        let result = validate_rule(&rule, &empty_ctx());
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "trigger"));
    }

    #[test]
    fn trigger_action_name_collision_warns_without_blocking() {
        let mut rule = PolicyRule::new(ProjectId(1), "r");
        rule.trigger = Some(TriggerId(1));
        rule.actions.insert(ActionId(1));
        let mut ctx = empty_ctx();
        ctx.trigger = Some(Trigger::new(ProjectId(1), "Forward"));
        ctx.actions = vec![(ActionId(1), Some(Action::new(ProjectId(1), "forward")))];
        let result = validate_rule(&rule, &ctx);
        assert!(result.valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.message.contains("feedback loop")));
    }

    #[test]
    fn name_length_is_counted_in_characters_not_bytes() {
        // 255 two-byte characters: over the limit in bytes, within it in chars.
        let rule = PolicyRule::new(ProjectId(1), "é".repeat(MAX_NAME_LEN));
        let result = validate_rule(&rule, &empty_ctx());
        assert!(result.valid, "errors: {:?}", result.errors);

        let rule = PolicyRule::new(ProjectId(1), "é".repeat(MAX_NAME_LEN + 1));
        let result = validate_rule(&rule, &empty_ctx());
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "name"));
    }
}
