use serde::{Deserialize, Serialize};

/// Identifier newtypes for the policy entity graph.
///
/// Ids are allocated monotonically by the owning store (arena style), so a
/// larger id always means "created later". Id `0` is reserved for entities
/// that have not been persisted yet.
macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const UNSAVED: $name = $name(0);

            /// True once the owning store has assigned a real id.
            pub fn is_persisted(&self) -> bool {
                self.0 != 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// A tenant scope. Every other entity belongs to exactly one project.
    ProjectId
);
entity_id!(
    /// A typed communication endpoint (CAN, Modbus, HTTP server, file, ROS).
    NodeId
);
entity_id!(
    /// A node-owned protocol match filter.
    FilterId
);
entity_id!(
    /// A named condition that activates a rule.
    TriggerId
);
entity_id!(
    /// A named operation performed when a rule fires.
    ActionId
);
entity_id!(
    /// A policy rule binding nodes, trigger, filter and actions.
    RuleId
);

/// Discriminator for the supported endpoint node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Can,
    Modbus,
    HttpServer,
    FileInput,
    FileOutput,
    Ros,
}

impl NodeKind {
    /// Human-readable label used in default names and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Can => "CAN",
            NodeKind::Modbus => "Modbus",
            NodeKind::HttpServer => "HTTP Server",
            NodeKind::FileInput => "File Input",
            NodeKind::FileOutput => "File Output",
            NodeKind::Ros => "ROS",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Can => write!(f, "CAN"),
            NodeKind::Modbus => write!(f, "MODBUS"),
            NodeKind::HttpServer => write!(f, "HTTP_SERVER"),
            NodeKind::FileInput => write!(f, "FILE_INPUT"),
            NodeKind::FileOutput => write!(f, "FILE_OUTPUT"),
            NodeKind::Ros => write!(f, "ROS"),
        }
    }
}
