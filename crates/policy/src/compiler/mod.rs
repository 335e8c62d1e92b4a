//! Compiles validated rules into the canonical JSON artifact the external
//! execution runtime consumes.
//!
//! Compilation is batch-tolerant: a rule missing a required component is
//! recorded as a [`CompileFailure`] and skipped, the rest of the batch still
//! compiles. Strict mode turns any failure into an error.

mod document;

pub use document::{
    CompiledAction, CompiledFilter, CompiledNode, CompiledRule, CompiledTrigger, PolicyDocument,
};

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use gridgate_core::RuleId;

use crate::error::{PolicyError, Result};
use crate::model::{Action, Node, PolicyRule, ProtocolFilter, Trigger};

/// Why a single rule could not be compiled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileFailure {
    pub rule_id: RuleId,
    pub rule_name: String,
    pub reason: String,
}

impl std::fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rule '{}' ({}): {}", self.rule_name, self.rule_id, self.reason)
    }
}

/// Result of compiling a ranked batch of rules.
#[derive(Debug)]
pub struct CompileOutcome {
    pub document: PolicyDocument,
    pub failures: Vec<CompileFailure>,
}

/// Pre-compilation hook for derived values (scaling factors, unit
/// conversions, computed channel mappings). Runs once over the batch before
/// any rule is compiled.
pub trait CalculatedValuePass: Send + Sync {
    fn run(&self, rules: &mut [PolicyRule]) -> Result<()>;
}

/// Everything a rule's id references resolve to, gathered by the engine.
pub struct RuleRefs {
    pub source: Option<Node>,
    pub destination: Option<Node>,
    pub trigger: Option<Trigger>,
    pub filter: Option<ProtocolFilter>,
    /// In rule action-set order (ascending id).
    pub actions: Vec<Action>,
}

fn compiled_node(node: &Node) -> CompiledNode {
    CompiledNode {
        id: node.id,
        node_type: node.kind().to_string(),
        name: node.name.clone(),
    }
}

/// Compiles one rule, or explains why it cannot execute.
pub fn compile_rule(rule: &PolicyRule, refs: &RuleRefs) -> std::result::Result<CompiledRule, CompileFailure> {
    let fail = |reason: String| CompileFailure {
        rule_id: rule.id,
        rule_name: rule.name.clone(),
        reason,
    };

    let source = refs
        .source
        .as_ref()
        .ok_or_else(|| fail("missing source node".to_string()))?;
    let destination = refs
        .destination
        .as_ref()
        .ok_or_else(|| fail("missing destination node".to_string()))?;

    let filter = refs.filter.as_ref().map(|f| {
        let mut variables = f.variables.clone();
        variables.sort_by_key(|v| v.to_lowercase());
        CompiledFilter {
            id: f.id,
            name: f.name.clone(),
            enabled: f.enabled,
            execution_order: f.execution_order,
            match_spec: f.match_spec.clone(),
            variables,
        }
    });

    let mut actions: Vec<CompiledAction> = refs
        .actions
        .iter()
        .map(|a| CompiledAction {
            id: a.id,
            name: a.name.clone(),
        })
        .collect();
    actions.sort_by_key(|a| a.id);

    Ok(CompiledRule {
        id: rule.id,
        name: rule.name.clone(),
        priority: rule.rule_priority,
        execution_order: rule.execution_order,
        source_node: compiled_node(source),
        destination_node: compiled_node(destination),
        trigger: refs.trigger.as_ref().map(|t| CompiledTrigger {
            id: t.id,
            name: t.name.clone(),
        }),
        filter,
        actions,
        log_enabled: rule.log_enabled,
    })
}

/// Compiles a ranked batch. `resolve` maps each rule to its resolved
/// references; the engine supplies a closure over its stores.
pub fn compile_batch<F>(rules: &[PolicyRule], mut resolve: F, strict: bool) -> Result<CompileOutcome>
where
    F: FnMut(&PolicyRule) -> RuleRefs,
{
    let mut compiled = Vec::with_capacity(rules.len());
    let mut failures = Vec::new();

    for rule in rules {
        let refs = resolve(rule);
        match compile_rule(rule, &refs) {
            Ok(c) => {
                debug!(rule = %rule.name, "compiled rule");
                compiled.push(c);
            }
            Err(failure) => {
                warn!(rule = %failure.rule_name, reason = %failure.reason, "skipping rule");
                failures.push(failure);
            }
        }
    }

    if strict && !failures.is_empty() {
        return Err(PolicyError::StrictCompile(failures));
    }

    Ok(CompileOutcome {
        document: PolicyDocument { rules: compiled },
        failures,
    })
}

/// Canonical pretty-JSON rendering of the document. Deterministic for
/// unchanged input: field order is fixed and collections are pre-sorted.
pub fn to_pretty_json(document: &PolicyDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Writes the artifact to `path`, creating parent directories as needed.
pub fn write_artifact(document: &PolicyDocument, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = to_pretty_json(document)?;
    fs::write(path, &json)?;
    info!(path = %path.display(), rules = document.rules.len(), "wrote policy artifact");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterMatch, NodeConfig};
    use gridgate_core::{ActionId, NodeId, ProjectId, RuleId};

    fn node(id: u64, name: &str, config: NodeConfig) -> Node {
        let mut n = Node::new(ProjectId(1), name, config);
        n.id = NodeId(id);
        n
    }

    fn can_config() -> NodeConfig {
        NodeConfig::Can {
            interface: "can0".to_string(),
            bitrate: 500_000,
        }
    }

    fn http_config() -> NodeConfig {
        NodeConfig::HttpServer {
            bind_address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }

    fn complete_refs() -> RuleRefs {
        RuleRefs {
            source: Some(node(1, "bus", can_config())),
            destination: Some(node(2, "api", http_config())),
            trigger: None,
            filter: None,
            actions: Vec::new(),
        }
    }

    fn rule(id: u64) -> PolicyRule {
        let mut r = PolicyRule::new(ProjectId(1), format!("rule-{id}"));
        r.id = RuleId(id);
        r
    }

    #[test]
    fn missing_source_is_a_failure_not_an_abort() {
        let rules = vec![rule(1), rule(2)];
        let outcome = compile_batch(
            &rules,
            |r| {
                let mut refs = complete_refs();
                if r.id == RuleId(1) {
                    refs.source = None;
                }
                refs
            },
            false,
        )
        .unwrap();
        assert_eq!(outcome.document.rules.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].rule_id, RuleId(1));
        assert_eq!(outcome.failures[0].reason, "missing source node");
    }

    #[test]
    fn strict_mode_fails_the_batch() {
        let rules = vec![rule(1)];
        let result = compile_batch(
            &rules,
            |_| RuleRefs {
                source: None,
                destination: None,
                trigger: None,
                filter: None,
                actions: Vec::new(),
            },
            true,
        );
        assert!(matches!(result, Err(PolicyError::StrictCompile(f)) if f.len() == 1));
    }

    #[test]
    fn actions_sorted_by_id_and_variables_sorted() {
        let mut refs = complete_refs();
        let mut forward = Action::new(ProjectId(1), "forward");
        forward.id = ActionId(9);
        let mut log = Action::new(ProjectId(1), "log");
        log.id = ActionId(3);
        refs.actions = vec![forward, log];
        let mut filter = ProtocolFilter::new(
            NodeId(1),
            "CAN Filter",
            FilterMatch::Can {
                frame_id_pattern: "0x1.*".to_string(),
                payload_pattern: None,
                require_extended_frame: false,
            },
        );
        filter.variables = vec!["Speed".to_string(), "rpm".to_string(), "Brake".to_string()];
        refs.filter = Some(filter);

        let compiled = compile_rule(&rule(1), &refs).unwrap();
        let action_ids: Vec<u64> = compiled.actions.iter().map(|a| a.id.0).collect();
        assert_eq!(action_ids, vec![3, 9]);
        let vars = &compiled.filter.as_ref().unwrap().variables;
        assert_eq!(vars, &["Brake", "rpm", "Speed"]);
    }

    #[test]
    fn repeated_compilation_is_byte_identical() {
        let rules = vec![rule(1), rule(2)];
        let first = compile_batch(&rules, |_| complete_refs(), false).unwrap();
        let second = compile_batch(&rules, |_| complete_refs(), false).unwrap();
        assert_eq!(
            to_pretty_json(&first.document).unwrap(),
            to_pretty_json(&second.document).unwrap()
        );
    }

    #[test]
    fn write_artifact_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/policy_rules.json");
        let outcome = compile_batch(&[rule(1)], |_| complete_refs(), false).unwrap();
        write_artifact(&outcome.document, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"sourceNode\""));
        assert!(written.contains("\"logEnabled\""));
    }
}
