//! Canonical artifact document types.
//!
//! Field order in these structs is the wire order: serde emits struct fields
//! in declaration order, and every collection is sorted before serialization,
//! so compiling unchanged input always produces byte-identical output.

use serde::{Deserialize, Serialize};

use gridgate_core::{ActionId, FilterId, NodeId, RuleId, TriggerId};

/// The full compiled policy for one project, in evaluation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyDocument {
    pub rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledRule {
    pub id: RuleId,
    pub name: String,
    pub priority: i32,
    pub execution_order: i32,
    pub source_node: CompiledNode,
    pub destination_node: CompiledNode,
    pub trigger: Option<CompiledTrigger>,
    pub filter: Option<CompiledFilter>,
    /// Ordered by action id.
    pub actions: Vec<CompiledAction>,
    pub log_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledTrigger {
    pub id: TriggerId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledFilter {
    pub id: FilterId,
    pub name: String,
    pub enabled: bool,
    pub execution_order: i32,
    #[serde(rename = "match")]
    pub match_spec: crate::model::FilterMatch,
    /// Sorted case-insensitively.
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledAction {
    pub id: ActionId,
    pub name: String,
}
