//! Save-time validation with structured, field-level errors.
//!
//! Every create/update routes through here before the store commit; any
//! error aborts the whole write. Warnings (completeness, advisory) never
//! block. Checks are explicit, statically-typed functions per entity — no
//! runtime field discovery.

mod filter_checks;
mod rule_checks;

pub use filter_checks::{validate_filter, FilterValidationContext};
pub use rule_checks::{validate_rule, RuleValidationContext};

use serde::{Deserialize, Serialize};

/// Overall validation outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<FieldError>,
    pub warnings: Vec<FieldWarning>,
}

/// A blocking validation error naming the offending field or relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    /// Field-path-like location, e.g. `"rulePriority"` or `"filter.parentNode"`.
    pub path: String,
    pub message: String,
}

/// A non-blocking advisory warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldWarning {
    pub path: String,
    pub message: String,
}

impl ValidationResult {
    pub(crate) fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(FieldError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub(crate) fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(FieldWarning {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Compile a regex pattern, pushing a structured error on failure.
pub(crate) fn check_pattern(pattern: &str, path: &str, result: &mut ValidationResult) {
    if pattern.trim().is_empty() {
        result.error(path, "pattern is required");
        return;
    }
    if let Err(e) = regex::Regex::new(pattern) {
        result.error(path, format!("invalid regular expression: {e}"));
    }
}
