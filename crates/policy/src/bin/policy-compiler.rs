//! policy-compiler — load a project definition, validate it, and compile the
//! policy artifact for the execution runtime.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use gridgate_core::{config, Config};
use gridgate_policy::loader;
use gridgate_policy::protocol::JsonProtocolParser;
use gridgate_policy::runtime::ProcessRuntime;
use gridgate_policy::PolicyEngine;

// ── CLI ─────────────────────────────────────────────────────────────

/// Compile a policy project definition into the runtime artifact.
#[derive(Parser, Debug)]
#[command(name = "policy-compiler", version, about)]
struct Cli {
    /// Path to the project definition YAML file.
    project: PathBuf,

    /// Where to write the compiled artifact (overrides GRIDGATE_ARTIFACT_PATH).
    #[arg(long, env = "GRIDGATE_ARTIFACT_PATH")]
    output: Option<PathBuf>,

    /// Fail if any active rule cannot be compiled.
    #[arg(long)]
    strict: bool,
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    config::load_dotenv();
    let cli = Cli::parse();

    let mut cfg = Config::from_env()?;
    if let Some(output) = cli.output {
        cfg.artifact.path = output;
    }
    let artifact_path = cfg.artifact.path.clone();
    let runtime_cfg = cfg.runtime.clone();

    let mut engine = PolicyEngine::new(cfg, Box::new(JsonProtocolParser));
    if runtime_cfg.enabled && runtime_cfg.start_command.is_some() {
        engine = engine.with_runtime(Box::new(ProcessRuntime::new(runtime_cfg)));
    }

    let report = loader::load_project_file(&engine, &cli.project)?;
    info!(
        nodes = report.nodes,
        filters = report.filters,
        triggers = report.triggers,
        actions = report.actions,
        rules = report.rules,
        "project definition loaded"
    );
    for warning in &report.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }

    let outcome = engine.apply_policy(report.project, cli.strict)?;
    for failure in &outcome.failures {
        warn!(rule = %failure.rule_name, reason = %failure.reason, "rule skipped");
    }
    info!(
        path = %artifact_path.display(),
        compiled = outcome.document.rules.len(),
        skipped = outcome.failures.len(),
        "policy artifact written"
    );
    Ok(())
}
