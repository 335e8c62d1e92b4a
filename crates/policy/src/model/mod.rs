//! Entity model for the policy graph.
//!
//! Plain data types only; cross-entity invariants live in [`crate::validation`]
//! and are enforced by [`crate::engine::PolicyEngine`] on every save.
//! Entities reference each other by id, resolved through the stores — no
//! embedded back-pointers.

mod catalog;
mod filter;
mod node;
mod rule;

pub use catalog::*;
pub use filter::*;
pub use node::*;
pub use rule::*;

/// Maximum length accepted for entity names.
pub const MAX_NAME_LEN: usize = 255;

/// Default rule priority assigned by the project-scoped factory.
pub const DEFAULT_RULE_PRIORITY: i32 = 50;

/// Inclusive rule-priority bounds.
pub const MIN_RULE_PRIORITY: i32 = 1;
pub const MAX_RULE_PRIORITY: i32 = 100;
