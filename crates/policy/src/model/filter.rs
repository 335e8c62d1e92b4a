//! Node-owned protocol match filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gridgate_core::{FilterId, NodeId, NodeKind};

/// A match predicate owned by exactly one node (`parent_node`).
///
/// The variable list is a soft invariant: it should be a subset of the
/// variables extractable from the parent node's protocol definition, but this
/// is only enforced at the candidate-list level — the protocol file may be
/// uploaded after the filter is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolFilter {
    pub id: FilterId,
    pub parent_node: NodeId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub enabled: bool,
    /// Tie-break for matching precedence among filters of the same node.
    pub execution_order: i32,
    #[serde(rename = "match")]
    pub match_spec: FilterMatch,
    /// Protocol variable names referenced by this filter.
    #[serde(default)]
    pub variables: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProtocolFilter {
    pub fn new(parent_node: NodeId, name: impl Into<String>, match_spec: FilterMatch) -> Self {
        let now = Utc::now();
        Self {
            id: FilterId::UNSAVED,
            parent_node,
            name: name.into(),
            description: None,
            enabled: true,
            execution_order: 0,
            match_spec,
            variables: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Type-specific match predicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterMatch {
    /// CAN frame matching: regex on the frame identifier, optional regex on
    /// the payload bytes (hex form), optional extended-frame requirement.
    Can {
        frame_id_pattern: String,
        #[serde(default)]
        payload_pattern: Option<String>,
        #[serde(default)]
        require_extended_frame: bool,
    },
    /// Generic payload regex matching, usable on any node kind.
    Payload { pattern: String },
}

impl FilterMatch {
    /// Whether this predicate can be evaluated on a node of the given kind.
    pub fn is_compatible_with(&self, kind: NodeKind) -> bool {
        match self {
            FilterMatch::Can { .. } => kind == NodeKind::Can,
            FilterMatch::Payload { .. } => true,
        }
    }

    /// Short label for error messages.
    pub fn kind_label(&self) -> &'static str {
        match self {
            FilterMatch::Can { .. } => "CAN",
            FilterMatch::Payload { .. } => "payload",
        }
    }
}
