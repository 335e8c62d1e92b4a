//! Endpoint nodes: one generic struct parameterized by a kind-specific
//! configuration payload instead of one entity type per protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gridgate_core::{NodeId, NodeKind, ProjectId};

use crate::protocol::ProtocolDefinition;

/// A typed communication endpoint scoped to a project. Owns its filters:
/// deleting a node deletes the filters attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub project: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub config: NodeConfig,
    /// Uploaded protocol definition (raw content + parse summary).
    #[serde(default)]
    pub protocol: ProtocolDefinition,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node {
    pub fn new(project: ProjectId, name: impl Into<String>, config: NodeConfig) -> Self {
        let now = Utc::now();
        Self {
            id: NodeId::UNSAVED,
            project,
            name: name.into(),
            description: None,
            config,
            protocol: ProtocolDefinition::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.config.kind()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Protocol-specific node configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeConfig {
    Can {
        interface: String,
        bitrate: u32,
    },
    Modbus {
        host: String,
        port: u16,
        unit_id: u8,
    },
    HttpServer {
        bind_address: String,
        port: u16,
    },
    FileInput {
        path: String,
        poll_interval_ms: u64,
    },
    FileOutput {
        path: String,
        append: bool,
    },
    Ros {
        topic: String,
        message_type: String,
    },
}

impl NodeConfig {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeConfig::Can { .. } => NodeKind::Can,
            NodeConfig::Modbus { .. } => NodeKind::Modbus,
            NodeConfig::HttpServer { .. } => NodeKind::HttpServer,
            NodeConfig::FileInput { .. } => NodeKind::FileInput,
            NodeConfig::FileOutput { .. } => NodeKind::FileOutput,
            NodeConfig::Ros { .. } => NodeKind::Ros,
        }
    }
}
