//! Protocol filter store: node-owned filters with ordered listing, unique
//! default-name generation and protocol-variable candidate resolution.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use tracing::warn;

use gridgate_core::{FilterId, NodeId};

use crate::error::{PolicyError, Result};
use crate::model::{Node, ProtocolFilter};
use crate::protocol::ProtocolParser;

pub struct FilterStore {
    inner: RwLock<Inner>,
}

struct Inner {
    next_id: u64,
    filters: HashMap<FilterId, ProtocolFilter>,
}

impl FilterStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                filters: HashMap::new(),
            }),
        }
    }

    /// Insert a new filter, assigning its id. Returns the stored copy.
    pub fn insert(&self, mut filter: ProtocolFilter) -> ProtocolFilter {
        let mut inner = self.inner.write().expect("filter store lock poisoned");
        filter.id = FilterId(inner.next_id);
        inner.next_id += 1;
        inner.filters.insert(filter.id, filter.clone());
        filter
    }

    /// Replace an existing filter.
    pub fn update(&self, mut filter: ProtocolFilter) -> Result<ProtocolFilter> {
        let mut inner = self.inner.write().expect("filter store lock poisoned");
        if !inner.filters.contains_key(&filter.id) {
            return Err(PolicyError::FilterNotFound(filter.id));
        }
        filter.touch();
        inner.filters.insert(filter.id, filter.clone());
        Ok(filter)
    }

    pub fn get(&self, id: FilterId) -> Option<ProtocolFilter> {
        self.inner
            .read()
            .expect("filter store lock poisoned")
            .filters
            .get(&id)
            .cloned()
    }

    pub fn remove(&self, id: FilterId) -> Option<ProtocolFilter> {
        self.inner
            .write()
            .expect("filter store lock poisoned")
            .filters
            .remove(&id)
    }

    /// All filters owned by a node, sorted by execution order ascending with
    /// case-insensitive name as tie-break. Empty if the node has none.
    pub fn list_by_parent_node(&self, parent: NodeId) -> Vec<ProtocolFilter> {
        let inner = self.inner.read().expect("filter store lock poisoned");
        let mut filters: Vec<ProtocolFilter> = inner
            .filters
            .values()
            .filter(|f| f.parent_node == parent)
            .cloned()
            .collect();
        filters.sort_by(|a, b| {
            a.execution_order
                .cmp(&b.execution_order)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        filters
    }

    /// Remove all filters owned by a node (cascade on node deletion).
    pub fn remove_by_parent_node(&self, parent: NodeId) -> usize {
        let mut inner = self.inner.write().expect("filter store lock poisoned");
        let doomed: Vec<FilterId> = inner
            .filters
            .values()
            .filter(|f| f.parent_node == parent)
            .map(|f| f.id)
            .collect();
        for id in &doomed {
            inner.filters.remove(id);
        }
        doomed.len()
    }

    /// Generate `"<Base>"`, `"<Base> 2"`, … — case-insensitively unique among
    /// the node's existing filter names.
    pub fn default_filter_name(&self, node: &Node) -> String {
        let base = format!("{} Filter", node.kind().label());
        let existing: Vec<String> = self
            .list_by_parent_node(node.id)
            .into_iter()
            .map(|f| f.name.to_lowercase())
            .collect();
        if !existing.contains(&base.to_lowercase()) {
            return base;
        }
        let mut index = 2;
        loop {
            let candidate = format!("{base} {index}");
            if !existing.contains(&candidate.to_lowercase()) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Deduplicated, case-insensitively sorted union of (i) variables the
    /// parser extracts from the node's stored protocol content and (ii) the
    /// variable names an existing filter already references — so editing a
    /// filter never silently drops a variable that is no longer discoverable.
    ///
    /// Parse failures degrade to the filter-side names only.
    pub fn resolve_variable_candidates(
        &self,
        node: &Node,
        existing: Option<FilterId>,
        parser: &dyn ProtocolParser,
    ) -> Vec<String> {
        // Keyed by lowercase for case-insensitive dedup; first spelling wins.
        let mut candidates: BTreeMap<String, String> = BTreeMap::new();

        if let Some(content) = &node.protocol.content {
            match parser.extract_variables(content) {
                Ok(names) => {
                    for name in names {
                        candidates.entry(name.to_lowercase()).or_insert(name);
                    }
                }
                Err(e) => {
                    warn!(node = %node.id, error = %e, "protocol variable extraction failed");
                }
            }
        }

        if let Some(id) = existing {
            if let Some(filter) = self.get(id) {
                for name in filter.variables {
                    candidates.entry(name.to_lowercase()).or_insert(name);
                }
            }
        }

        candidates.into_values().collect()
    }
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilterMatch, NodeConfig};
    use gridgate_core::ProjectId;

    fn can_node() -> Node {
        let mut node = Node::new(
            ProjectId(1),
            "engine-bus",
            NodeConfig::Can {
                interface: "can0".to_string(),
                bitrate: 500_000,
            },
        );
        node.id = gridgate_core::NodeId(7);
        node
    }

    fn can_filter(parent: NodeId, name: &str, order: i32) -> ProtocolFilter {
        let mut f = ProtocolFilter::new(
            parent,
            name,
            FilterMatch::Can {
                frame_id_pattern: "0x1.*".to_string(),
                payload_pattern: None,
                require_extended_frame: false,
            },
        );
        f.execution_order = order;
        f
    }

    #[test]
    fn list_by_parent_orders_by_execution_then_name() {
        let store = FilterStore::new();
        let node = NodeId(7);
        store.insert(can_filter(node, "beta", 1));
        store.insert(can_filter(node, "Alpha", 1));
        store.insert(can_filter(node, "zeta", 0));
        store.insert(can_filter(NodeId(8), "other-node", 0));

        let names: Vec<String> = store
            .list_by_parent_node(node)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["zeta", "Alpha", "beta"]);
    }

    #[test]
    fn default_name_skips_taken_names_case_insensitively() {
        let store = FilterStore::new();
        let node = can_node();
        assert_eq!(store.default_filter_name(&node), "CAN Filter");

        store.insert(can_filter(node.id, "can filter", 0));
        assert_eq!(store.default_filter_name(&node), "CAN Filter 2");

        store.insert(can_filter(node.id, "CAN FILTER 2", 0));
        assert_eq!(store.default_filter_name(&node), "CAN Filter 3");
    }

    #[test]
    fn variable_candidates_union_protocol_and_filter() {
        use crate::protocol::JsonProtocolParser;

        let store = FilterStore::new();
        let mut node = can_node();
        node.protocol.content = Some(
            r#"{"m1": {"name": "A"}, "m2": {"name": "B"}}"#.to_string(),
        );

        // Filter references a stale variable C no longer in the protocol.
        let mut filter = can_filter(node.id, "f", 0);
        filter.variables = vec!["C".to_string()];
        let filter = store.insert(filter);

        let candidates =
            store.resolve_variable_candidates(&node, Some(filter.id), &JsonProtocolParser);
        assert_eq!(candidates, vec!["A", "B", "C"]);
    }

    #[test]
    fn variable_candidates_degrade_to_empty_on_parse_error() {
        use crate::protocol::JsonProtocolParser;

        let store = FilterStore::new();
        let mut node = can_node();
        node.protocol.content = Some("garbage".to_string());
        let candidates = store.resolve_variable_candidates(&node, None, &JsonProtocolParser);
        assert!(candidates.is_empty());
    }
}
