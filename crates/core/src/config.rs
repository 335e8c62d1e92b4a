use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> Result<u64, CoreError> {
    match env_opt(key) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| CoreError::Config(format!("{key} must be an integer, got '{v}'"))),
    }
}

fn env_bool(key: &str, default: bool) -> Result<bool, CoreError> {
    match env_opt(key) {
        None => Ok(default),
        Some(v) => match v.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(CoreError::Config(format!(
                "{key} must be a boolean, got '{v}'"
            ))),
        },
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub artifact: ArtifactConfig,
    pub protocol: ProtocolConfig,
    pub runtime: RuntimeConfig,
}

/// Where the compiled policy document is written for the external runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub path: PathBuf,
}

/// Bounds for uploaded protocol-definition files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolConfig {
    pub max_file_bytes: u64,
}

/// External execution-runtime process control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Operator switch: when false, start/restart signals are refused.
    pub enabled: bool,
    /// Shell command that launches the runtime process.
    pub start_command: Option<String>,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Result<Self, CoreError> {
        Ok(Self {
            artifact: ArtifactConfig {
                path: PathBuf::from(env_or(
                    "GRIDGATE_ARTIFACT_PATH",
                    "data/policy/policy_rules.json",
                )),
            },
            protocol: ProtocolConfig {
                max_file_bytes: env_u64("GRIDGATE_PROTOCOL_MAX_BYTES", 10 * 1024 * 1024)?,
            },
            runtime: RuntimeConfig {
                enabled: env_bool("GRIDGATE_RUNTIME_ENABLED", true)?,
                start_command: env_opt("GRIDGATE_RUNTIME_START_COMMAND"),
            },
        })
    }
}
