//! Control surface for the external execution runtime.
//!
//! The engine never executes messages itself; it only signals the process
//! that does. [`ProcessRuntime`] spawns and kills a configured command and
//! reports best-effort status.

use std::process::{Child, Command};
use std::sync::Mutex;

use serde::Serialize;
use tracing::{info, warn};

use gridgate_core::config::RuntimeConfig;

use crate::error::{PolicyError, Result};

/// Snapshot of the runtime process state.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStatus {
    pub running: bool,
    pub enabled: bool,
    pub message: String,
}

pub trait RuntimeControl: Send + Sync {
    fn start(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
    fn restart(&self) -> Result<()> {
        self.stop()?;
        self.start()
    }
    fn status(&self) -> RuntimeStatus;
}

/// Spawns the runtime as a child process via `sh -c`.
pub struct ProcessRuntime {
    config: RuntimeConfig,
    child: Mutex<Option<Child>>,
}

impl ProcessRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            child: Mutex::new(None),
        }
    }

    fn is_running(child: &mut Option<Child>) -> bool {
        match child {
            // try_wait returning None means the process is still alive
            Some(c) => matches!(c.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl RuntimeControl for ProcessRuntime {
    fn start(&self) -> Result<()> {
        if !self.config.enabled {
            return Err(PolicyError::Runtime(
                "runtime control is disabled by configuration".to_string(),
            ));
        }
        let command = self.config.start_command.as_deref().ok_or_else(|| {
            PolicyError::Runtime("no runtime start command configured".to_string())
        })?;
        let mut guard = self.child.lock().expect("runtime child lock poisoned");
        if Self::is_running(&mut guard) {
            info!("runtime already running");
            return Ok(());
        }
        let spawned = Command::new("sh")
            .arg("-c")
            .arg(command)
            .spawn()
            .map_err(|e| PolicyError::Runtime(format!("failed to spawn runtime: {e}")))?;
        info!(pid = spawned.id(), command, "runtime started");
        *guard = Some(spawned);
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        let mut guard = self.child.lock().expect("runtime child lock poisoned");
        if let Some(mut child) = guard.take() {
            match child.kill() {
                Ok(()) => {
                    let _ = child.wait();
                    info!("runtime stopped");
                }
                Err(e) => warn!(error = %e, "runtime process was already gone"),
            }
        }
        Ok(())
    }

    fn status(&self) -> RuntimeStatus {
        let mut guard = self.child.lock().expect("runtime child lock poisoned");
        let running = Self::is_running(&mut guard);
        let message = if !self.config.enabled {
            "runtime control disabled".to_string()
        } else if running {
            "runtime process is running".to_string()
        } else {
            "runtime process is not running".to_string()
        };
        RuntimeStatus {
            running,
            enabled: self.config.enabled,
            message,
        }
    }
}
