//! Protocol-filter validation: ownership, regex compilation, kind
//! compatibility and per-node name uniqueness.

use gridgate_core::FilterId;

use super::{check_pattern, ValidationResult};
use crate::model::{FilterMatch, Node, ProtocolFilter, MAX_NAME_LEN};

pub struct FilterValidationContext {
    /// The filter's parent node, if it resolves.
    pub parent: Option<Node>,
    /// `(id, name)` of every filter already on the parent node, including this one.
    pub sibling_names: Vec<(FilterId, String)>,
}

pub fn validate_filter(filter: &ProtocolFilter, ctx: &FilterValidationContext) -> ValidationResult {
    let mut result = ValidationResult::new();

    if filter.name.trim().is_empty() {
        result.error("name", "name is required");
    }
    if filter.name.chars().count() > MAX_NAME_LEN {
        result.error(
            "name",
            format!("name exceeds maximum length of {MAX_NAME_LEN} characters"),
        );
    }
    if filter.execution_order < 0 {
        result.error(
            "executionOrder",
            format!("execution order must be non-negative, got {}", filter.execution_order),
        );
    }

    let Some(parent) = &ctx.parent else {
        result.error(
            "parentNode",
            format!("parent node {} does not exist", filter.parent_node),
        );
        return result;
    };

    if !filter.match_spec.is_compatible_with(parent.kind()) {
        result.error(
            "match",
            format!(
                "{} filters can only belong to a matching node kind, but node '{}' is {}",
                filter.match_spec.kind_label(),
                parent.name,
                parent.kind()
            ),
        );
    }

    match &filter.match_spec {
        FilterMatch::Can {
            frame_id_pattern,
            payload_pattern,
            ..
        } => {
            check_pattern(frame_id_pattern, "match.frameIdPattern", &mut result);
            if let Some(pattern) = payload_pattern {
                check_pattern(pattern, "match.payloadPattern", &mut result);
            }
        }
        FilterMatch::Payload { pattern } => {
            check_pattern(pattern, "match.pattern", &mut result);
        }
    }

    for (i, variable) in filter.variables.iter().enumerate() {
        if variable.trim().is_empty() {
            result.error(format!("variables[{i}]"), "variable name cannot be blank");
        }
    }

    let name = filter.name.to_lowercase();
    let duplicate = ctx
        .sibling_names
        .iter()
        .any(|(id, existing)| *id != filter.id && existing.to_lowercase() == name);
    if duplicate {
        result.error(
            "name",
            format!(
                "filter name '{}' already exists for node '{}'",
                filter.name, parent.name
            ),
        );
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeConfig;
    use gridgate_core::{NodeId, ProjectId};

    fn can_node(id: u64) -> Node {
        let mut node = Node::new(
            ProjectId(1),
            "bus",
            NodeConfig::Can {
                interface: "can0".to_string(),
                bitrate: 250_000,
            },
        );
        node.id = NodeId(id);
        node
    }

    fn http_node(id: u64) -> Node {
        let mut node = Node::new(
            ProjectId(1),
            "api",
            NodeConfig::HttpServer {
                bind_address: "0.0.0.0".to_string(),
                port: 8080,
            },
        );
        node.id = NodeId(id);
        node
    }

    fn can_filter(parent: NodeId) -> ProtocolFilter {
        ProtocolFilter::new(
            parent,
            "CAN Filter",
            FilterMatch::Can {
                frame_id_pattern: "0x1[0-9A-F]{2}".to_string(),
                payload_pattern: None,
                require_extended_frame: false,
            },
        )
    }

    fn ctx(parent: Node) -> FilterValidationContext {
        FilterValidationContext {
            parent: Some(parent),
            sibling_names: Vec::new(),
        }
    }

    #[test]
    fn valid_can_filter_passes() {
        let result = validate_filter(&can_filter(NodeId(1)), &ctx(can_node(1)));
        assert!(result.valid, "errors: {:?}", result.errors);
    }

    #[test]
    fn missing_parent_node_fails() {
        let result = validate_filter(
            &can_filter(NodeId(1)),
            &FilterValidationContext {
                parent: None,
                sibling_names: Vec::new(),
            },
        );
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "parentNode"));
    }

    #[test]
    fn can_filter_on_http_node_fails() {
        let result = validate_filter(&can_filter(NodeId(2)), &ctx(http_node(2)));
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "match"));
    }

    #[test]
    fn invalid_frame_id_regex_fails() {
        let mut filter = can_filter(NodeId(1));
        filter.match_spec = FilterMatch::Can {
            frame_id_pattern: "0x1[".to_string(),
            payload_pattern: None,
            require_extended_frame: false,
        };
        let result = validate_filter(&filter, &ctx(can_node(1)));
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "match.frameIdPattern"));
    }

    #[test]
    fn negative_execution_order_fails() {
        let mut filter = can_filter(NodeId(1));
        filter.execution_order = -1;
        let result = validate_filter(&filter, &ctx(can_node(1)));
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "executionOrder"));
    }

    #[test]
    fn multibyte_name_within_character_limit_passes() {
        let mut filter = can_filter(NodeId(1));
        filter.name = "ü".repeat(MAX_NAME_LEN);
        let result = validate_filter(&filter, &ctx(can_node(1)));
        assert!(result.valid, "errors: {:?}", result.errors);

        filter.name = "ü".repeat(MAX_NAME_LEN + 1);
        let result = validate_filter(&filter, &ctx(can_node(1)));
        assert!(!result.valid);
    }

    #[test]
    fn duplicate_name_on_same_node_fails_case_insensitively() {
        let filter = can_filter(NodeId(1));
        let mut context = ctx(can_node(1));
        context
            .sibling_names
            .push((FilterId(99), "can filter".to_string()));
        let result = validate_filter(&filter, &context);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.path == "name"));
    }
}
