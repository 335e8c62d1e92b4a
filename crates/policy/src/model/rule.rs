//! The central policy-rule entity.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gridgate_core::{ActionId, FilterId, NodeId, ProjectId, RuleId, TriggerId};

use super::DEFAULT_RULE_PRIORITY;

/// Binds a source node, destination node, trigger, optional filter and a set
/// of actions, with a numeric priority and an explicit execution order.
///
/// Rules reference other entities by id only; they do not own their lifecycle.
/// Every mutation goes through [`crate::engine::PolicyEngine::save_rule`],
/// which runs the full validation routine before committing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRule {
    pub id: RuleId,
    pub project: ProjectId,
    /// Unique within the project, case-insensitively.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// 1..=100, higher wins.
    pub rule_priority: i32,
    /// Secondary ordering key among rules of equal priority. Non-negative.
    pub execution_order: i32,
    pub log_enabled: bool,
    /// Gates the completeness warning: active rules missing components are
    /// saved with a warning instead of silently.
    pub active: bool,
    pub source_node: Option<NodeId>,
    pub destination_node: Option<NodeId>,
    pub trigger: Option<TriggerId>,
    /// Unordered, deduplicated by identity.
    #[serde(default)]
    pub actions: BTreeSet<ActionId>,
    pub filter: Option<FilterId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PolicyRule {
    /// Project-scoped factory with defaults (`rule_priority = 50`,
    /// `log_enabled = false`, inactive, no references).
    pub fn new(project: ProjectId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: RuleId::UNSAVED,
            project,
            name: name.into(),
            description: None,
            rule_priority: DEFAULT_RULE_PRIORITY,
            execution_order: 0,
            log_enabled: false,
            active: false,
            source_node: None,
            destination_node: None,
            trigger: None,
            actions: BTreeSet::new(),
            filter: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Names of the components an executable rule still lacks.
    pub fn missing_components(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.source_node.is_none() {
            missing.push("sourceNode");
        }
        if self.destination_node.is_none() {
            missing.push("destinationNode");
        }
        if self.trigger.is_none() {
            missing.push("trigger");
        }
        if self.actions.is_empty() {
            missing.push("actions");
        }
        missing
    }

    /// True when the rule has everything it needs to execute.
    pub fn is_complete(&self) -> bool {
        self.missing_components().is_empty()
    }
}
