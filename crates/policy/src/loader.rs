//! YAML project-definition loader.
//!
//! Deserializes a whole project (nodes, filters, triggers, actions, rules)
//! from one document, resolving by-name references into store ids as it
//! inserts through the engine. Every filter and rule goes through the normal
//! validation path; the load aborts at the first failure.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use gridgate_core::{ActionId, FilterId, NodeId, ProjectId, TriggerId};

use crate::engine::PolicyEngine;
use crate::error::{PolicyError, Result};
use crate::model::{FilterMatch, NodeConfig, PolicyRule, ProtocolFilter};
use crate::validation::{FieldError, FieldWarning};

// ── Raw document shape ────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProject {
    project: String,
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    filters: Vec<RawFilter>,
    #[serde(default)]
    triggers: Vec<String>,
    #[serde(default)]
    actions: Vec<String>,
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNode {
    name: String,
    #[serde(default)]
    description: Option<String>,
    config: NodeConfig,
    /// Inline protocol content, stored as uploaded ("<name>.json" semantics).
    #[serde(default)]
    protocol: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFilter {
    node: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    execution_order: i32,
    #[serde(rename = "match")]
    match_spec: FilterMatch,
    #[serde(default)]
    variables: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_priority")]
    priority: i32,
    #[serde(default)]
    execution_order: i32,
    #[serde(default)]
    log_enabled: bool,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    source_node: Option<String>,
    #[serde(default)]
    destination_node: Option<String>,
    #[serde(default)]
    trigger: Option<String>,
    #[serde(default)]
    actions: Vec<String>,
    #[serde(default)]
    filter: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> i32 {
    crate::model::DEFAULT_RULE_PRIORITY
}

// ── Loading ───────────────────────────────────────────────────

/// Summary of a successful load.
#[derive(Debug)]
pub struct LoadReport {
    pub project: ProjectId,
    pub nodes: usize,
    pub filters: usize,
    pub triggers: usize,
    pub actions: usize,
    pub rules: usize,
    /// Advisory warnings collected across all rule saves.
    pub warnings: Vec<FieldWarning>,
}

/// Load a project definition file into the engine.
pub fn load_project_file(engine: &PolicyEngine, path: &Path) -> Result<LoadReport> {
    let content = fs::read_to_string(path)?;
    load_project_str(engine, &content)
}

/// Load a project definition from YAML text.
pub fn load_project_str(engine: &PolicyEngine, yaml: &str) -> Result<LoadReport> {
    let raw: RawProject = serde_yaml::from_str(yaml)?;
    let project = engine.create_project(raw.project.clone());

    let mut node_ids: HashMap<String, NodeId> = HashMap::new();
    for (i, raw_node) in raw.nodes.into_iter().enumerate() {
        let mut node = engine.add_node(project, raw_node.name.clone(), raw_node.config)?;
        if raw_node.description.is_some() {
            node.description = raw_node.description;
            node = engine.update_node(node)?;
        }
        if node_ids.insert(raw_node.name.clone(), node.id).is_some() {
            return Err(unresolved(
                format!("nodes[{i}].name"),
                format!("duplicate node name '{}'", raw_node.name),
            ));
        }
        if let Some(protocol) = raw_node.protocol {
            let file_name = format!("{}.json", raw_node.name);
            engine.ingest_protocol(node.id, &file_name, protocol)?;
        }
    }

    // Filter ids are looked up as (node name, filter name) since filter names
    // are only unique per node.
    let mut filter_ids: HashMap<(String, String), FilterId> = HashMap::new();
    for (i, raw_filter) in raw.filters.into_iter().enumerate() {
        let parent = *node_ids.get(&raw_filter.node).ok_or_else(|| {
            unresolved(
                format!("filters[{i}].node"),
                format!("unknown node '{}'", raw_filter.node),
            )
        })?;
        let mut filter = ProtocolFilter::new(parent, raw_filter.name.clone(), raw_filter.match_spec);
        filter.description = raw_filter.description;
        filter.enabled = raw_filter.enabled;
        filter.execution_order = raw_filter.execution_order;
        filter.variables = raw_filter.variables;
        let saved = engine.save_filter(filter)?;
        filter_ids.insert((raw_filter.node, raw_filter.name), saved.id);
    }

    let mut trigger_ids: HashMap<String, TriggerId> = HashMap::new();
    for name in raw.triggers {
        let trigger = engine.add_trigger(project, name.clone())?;
        trigger_ids.insert(name, trigger.id);
    }
    let mut action_ids: HashMap<String, ActionId> = HashMap::new();
    for name in raw.actions {
        let action = engine.add_action(project, name.clone())?;
        action_ids.insert(name, action.id);
    }

    let mut warnings = Vec::new();
    let mut rule_count = 0;
    for (i, raw_rule) in raw.rules.into_iter().enumerate() {
        let mut rule = PolicyRule::new(project, raw_rule.name);
        rule.description = raw_rule.description;
        rule.rule_priority = raw_rule.priority;
        rule.execution_order = raw_rule.execution_order;
        rule.log_enabled = raw_rule.log_enabled;
        rule.active = raw_rule.active;

        rule.source_node = resolve_opt(&node_ids, raw_rule.source_node, i, "sourceNode", "node")?;
        rule.destination_node =
            resolve_opt(&node_ids, raw_rule.destination_node, i, "destinationNode", "node")?;
        rule.trigger = resolve_opt(&trigger_ids, raw_rule.trigger, i, "trigger", "trigger")?;

        let mut actions = BTreeSet::new();
        for name in raw_rule.actions {
            let id = *action_ids.get(&name).ok_or_else(|| {
                unresolved(
                    format!("rules[{i}].actions"),
                    format!("unknown action '{name}'"),
                )
            })?;
            actions.insert(id);
        }
        rule.actions = actions;

        if let Some(name) = raw_rule.filter {
            let source = rule.source_node.ok_or_else(|| {
                unresolved(
                    format!("rules[{i}].filter"),
                    "a rule filter requires a source node".to_string(),
                )
            })?;
            let source_name = node_ids
                .iter()
                .find(|(_, &id)| id == source)
                .map(|(n, _)| n.clone())
                .unwrap_or_default();
            rule.filter = Some(
                *filter_ids
                    .get(&(source_name.clone(), name.clone()))
                    .ok_or_else(|| {
                        unresolved(
                            format!("rules[{i}].filter"),
                            format!("unknown filter '{name}' on node '{source_name}'"),
                        )
                    })?,
            );
        }

        let report = engine.save_rule(rule)?;
        warnings.extend(report.warnings);
        rule_count += 1;
    }

    let report = LoadReport {
        project,
        nodes: node_ids.len(),
        filters: filter_ids.len(),
        triggers: trigger_ids.len(),
        actions: action_ids.len(),
        rules: rule_count,
        warnings,
    };
    info!(
        project = %report.project,
        nodes = report.nodes,
        filters = report.filters,
        rules = report.rules,
        "loaded project definition"
    );
    Ok(report)
}

fn resolve_opt<I: Copy>(
    ids: &HashMap<String, I>,
    name: Option<String>,
    rule_index: usize,
    path: &str,
    kind: &str,
) -> Result<Option<I>> {
    match name {
        None => Ok(None),
        Some(name) => ids.get(&name).copied().map(Some).ok_or_else(|| {
            unresolved(
                format!("rules[{rule_index}].{path}"),
                format!("unknown {kind} '{name}'"),
            )
        }),
    }
}

fn unresolved(path: String, message: String) -> PolicyError {
    PolicyError::Validation(vec![FieldError { path, message }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JsonProtocolParser;
    use gridgate_core::config::{ArtifactConfig, ProtocolConfig, RuntimeConfig};
    use gridgate_core::Config;

    fn engine() -> PolicyEngine {
        let config = Config {
            artifact: ArtifactConfig {
                path: "unused.json".into(),
            },
            protocol: ProtocolConfig {
                max_file_bytes: 1024 * 1024,
            },
            runtime: RuntimeConfig {
                enabled: false,
                start_command: None,
            },
        };
        PolicyEngine::new(config, Box::new(JsonProtocolParser))
    }

    const DOC: &str = r#"
project: gateway
nodes:
  - name: engine-bus
    config: { type: can, interface: can0, bitrate: 500000 }
    protocol: '{"m1": {"name": "EngineSpeed"}}'
  - name: cloud-api
    config: { type: http_server, bind_address: 0.0.0.0, port: 8080 }
filters:
  - node: engine-bus
    name: CAN Filter
    match: { type: can, frame_id_pattern: "0x1[0-9A-F]{2}" }
    variables: [EngineSpeed]
triggers: [on-frame]
actions: [forward]
rules:
  - name: forward-engine-frames
    priority: 75
    active: true
    source_node: engine-bus
    destination_node: cloud-api
    trigger: on-frame
    actions: [forward]
    filter: CAN Filter
"#;

    #[test]
    fn loads_a_complete_project() {
        let engine = engine();
        let report = load_project_str(&engine, DOC).unwrap();
        assert_eq!(report.nodes, 2);
        assert_eq!(report.filters, 1);
        assert_eq!(report.rules, 1);
        assert!(report.warnings.is_empty());

        let rules = engine.list_rules(report.project);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule_priority, 75);
        assert!(rules[0].filter.is_some());
    }

    #[test]
    fn unknown_reference_fails_the_load() {
        let engine = engine();
        let doc = r#"
project: p
rules:
  - name: r
    source_node: no-such-node
"#;
        let err = load_project_str(&engine, doc).unwrap_err();
        let PolicyError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors[0].path, "rules[0].sourceNode");
    }

    #[test]
    fn unknown_yaml_field_is_rejected() {
        let engine = engine();
        let doc = "project: p\nbogus: field\n";
        assert!(matches!(
            load_project_str(&engine, doc),
            Err(PolicyError::Yaml(_))
        ));
    }
}
