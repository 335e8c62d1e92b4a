//! Protocol-definition ingestion boundary.
//!
//! The actual protocol file format is a black box: a [`ProtocolParser`]
//! collaborator converts uploaded content into a flat list of variable names.
//! This module stores and relays the parse summary; it never interprets the
//! file beyond handing it to the parser. Parse failures degrade to an ERROR
//! summary (and an empty candidate list), they do not fail the rule engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the most recent protocol upload for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolStatus {
    Parsed,
    Error,
    NoFile,
}

/// Stored/relayed summary of the last parse attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSummary {
    pub status: ProtocolStatus,
    pub message: String,
    pub file_size_bytes: u64,
    pub variable_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl ProtocolSummary {
    pub fn no_file() -> Self {
        Self {
            status: ProtocolStatus::NoFile,
            message: "No protocol file is loaded.".to_string(),
            file_size_bytes: 0,
            variable_count: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn parsed(variable_count: usize, file_size_bytes: u64) -> Self {
        Self {
            status: ProtocolStatus::Parsed,
            message: format!("Loaded {variable_count} protocol variable(s)."),
            file_size_bytes,
            variable_count,
            updated_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>, file_size_bytes: u64) -> Self {
        let message = message.into();
        let message = if message.is_empty() {
            "File parse error.".to_string()
        } else {
            format!("File parse error. {message}")
        };
        Self {
            status: ProtocolStatus::Error,
            message,
            file_size_bytes,
            variable_count: 0,
            updated_at: Utc::now(),
        }
    }
}

impl Default for ProtocolSummary {
    fn default() -> Self {
        Self::no_file()
    }
}

/// Raw protocol content plus its parse summary, stored on a node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolDefinition {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub summary: ProtocolSummary,
}

/// External parser collaborator: converts uploaded protocol content into a
/// flat list of variable names. Errors are plain messages; the caller turns
/// them into an ERROR summary.
pub trait ProtocolParser: Send + Sync {
    /// The single well-known file extension this parser accepts (without dot).
    fn file_extension(&self) -> &'static str;

    fn extract_variables(&self, content: &str) -> std::result::Result<Vec<String>, String>;
}

/// Reference parser for the companion-JSON protocol format: a top-level
/// object whose entries carry a `"name"` field. Keys starting with `_` are
/// bookkeeping, except `_all_variables` which holds a comma-separated
/// variable list.
#[derive(Debug, Default)]
pub struct JsonProtocolParser;

impl ProtocolParser for JsonProtocolParser {
    fn file_extension(&self) -> &'static str {
        "json"
    }

    fn extract_variables(&self, content: &str) -> std::result::Result<Vec<String>, String> {
        let root: serde_json::Value =
            serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))?;
        let map = root
            .as_object()
            .ok_or_else(|| "protocol JSON root must be an object".to_string())?;

        let mut variables = Vec::new();
        for (key, value) in map {
            if key == "_all_variables" {
                if let Some(csv) = value.as_str() {
                    variables.extend(
                        csv.split(',')
                            .map(str::trim)
                            .filter(|t| !t.is_empty())
                            .map(String::from),
                    );
                }
                continue;
            }
            if key.starts_with('_') {
                continue;
            }
            if let Some(name) = value.get("name").and_then(|n| n.as_str()) {
                let name = name.trim();
                if !name.is_empty() {
                    variables.push(name.to_string());
                }
            }
        }
        Ok(variables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_parser_extracts_entry_names_and_csv_list() {
        let content = r#"{
            "msg1": { "name": "EngineSpeed", "bits": 16 },
            "msg2": { "name": "CoolantTemp" },
            "_meta": { "name": "ignored" },
            "_all_variables": "OilPressure, BoostTarget"
        }"#;
        let vars = JsonProtocolParser.extract_variables(content).unwrap();
        assert!(vars.contains(&"EngineSpeed".to_string()));
        assert!(vars.contains(&"CoolantTemp".to_string()));
        assert!(vars.contains(&"OilPressure".to_string()));
        assert!(vars.contains(&"BoostTarget".to_string()));
        assert!(!vars.contains(&"ignored".to_string()));
    }

    #[test]
    fn json_parser_rejects_malformed_content() {
        assert!(JsonProtocolParser.extract_variables("not json").is_err());
        assert!(JsonProtocolParser.extract_variables("[1,2,3]").is_err());
    }

    #[test]
    fn summary_constructors() {
        let s = ProtocolSummary::no_file();
        assert_eq!(s.status, ProtocolStatus::NoFile);

        let s = ProtocolSummary::parsed(12, 4096);
        assert_eq!(s.status, ProtocolStatus::Parsed);
        assert_eq!(s.variable_count, 12);
        assert_eq!(s.file_size_bytes, 4096);

        let s = ProtocolSummary::error("bad header", 100);
        assert_eq!(s.status, ProtocolStatus::Error);
        assert!(s.message.contains("bad header"));
    }
}
