//! Node store: one generic store parameterized by node kind instead of one
//! store implementation per protocol subtype.

use std::collections::HashMap;
use std::sync::RwLock;

use gridgate_core::{NodeId, ProjectId};

use crate::error::{PolicyError, Result};
use crate::model::Node;

pub struct NodeStore {
    inner: RwLock<Inner>,
}

struct Inner {
    next_id: u64,
    nodes: HashMap<NodeId, Node>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                nodes: HashMap::new(),
            }),
        }
    }

    /// Insert a new node, assigning its id. Returns the stored copy.
    pub fn insert(&self, mut node: Node) -> Node {
        let mut inner = self.inner.write().expect("node store lock poisoned");
        node.id = NodeId(inner.next_id);
        inner.next_id += 1;
        inner.nodes.insert(node.id, node.clone());
        node
    }

    /// Replace an existing node.
    pub fn update(&self, mut node: Node) -> Result<Node> {
        let mut inner = self.inner.write().expect("node store lock poisoned");
        if !inner.nodes.contains_key(&node.id) {
            return Err(PolicyError::NodeNotFound(node.id));
        }
        node.touch();
        inner.nodes.insert(node.id, node.clone());
        Ok(node)
    }

    pub fn get(&self, id: NodeId) -> Option<Node> {
        self.inner
            .read()
            .expect("node store lock poisoned")
            .nodes
            .get(&id)
            .cloned()
    }

    /// All nodes in a project, sorted by case-insensitive name.
    pub fn list_by_project(&self, project: ProjectId) -> Vec<Node> {
        let inner = self.inner.read().expect("node store lock poisoned");
        let mut nodes: Vec<Node> = inner
            .nodes
            .values()
            .filter(|n| n.project == project)
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        nodes
    }

    pub fn remove(&self, id: NodeId) -> Option<Node> {
        self.inner
            .write()
            .expect("node store lock poisoned")
            .nodes
            .remove(&id)
    }
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}
