//! Trigger and action catalog entries: named, project-scoped, pass-through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gridgate_core::{ActionId, ProjectId, TriggerId};

/// A named condition that activates a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub project: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Trigger {
    pub fn new(project: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id: TriggerId::UNSAVED,
            project,
            name: name.into(),
            description: None,
            created_at: Utc::now(),
        }
    }
}

/// A named operation performed when a rule fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    pub project: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Action {
    pub fn new(project: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id: ActionId::UNSAVED,
            project,
            name: name.into(),
            description: None,
            created_at: Utc::now(),
        }
    }
}
