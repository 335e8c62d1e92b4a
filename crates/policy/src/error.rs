//! Error taxonomy for the policy engine.
//!
//! Validation errors block the write; completeness warnings never do (they
//! travel in [`crate::engine::SaveReport`], not here). Ingest errors are
//! recorded as status summaries at the protocol boundary and only surface
//! here when the upload itself is rejected (too large, wrong extension).

use gridgate_core::{ActionId, FilterId, NodeId, ProjectId, RuleId, TriggerId};

use crate::compiler::CompileFailure;
use crate::validation::FieldError;

/// Errors raised by engine, stores, compiler and boundaries.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// Blocking validation failure; the write was aborted.
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("filter not found: {0}")]
    FilterNotFound(FilterId),

    #[error("trigger not found: {0}")]
    TriggerNotFound(TriggerId),

    #[error("action not found: {0}")]
    ActionNotFound(ActionId),

    #[error("rule not found: {0}")]
    RuleNotFound(RuleId),

    /// Deletion refused because other entities still reference the target.
    #[error("cannot delete {entity}: still referenced by {references}")]
    ReferencedBy { entity: String, references: String },

    /// Upload rejected at the protocol ingestion boundary.
    #[error("protocol upload rejected: {0}")]
    Ingest(String),

    /// Strict-mode compilation with at least one per-rule failure.
    #[error("compilation failed for {} rule(s) in strict mode", .0.len())]
    StrictCompile(Vec<CompileFailure>),

    #[error("runtime control error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| {
            if e.path.is_empty() {
                e.message.clone()
            } else {
                format!("{}: {}", e.path, e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
