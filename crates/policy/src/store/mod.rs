//! Arena-style in-memory stores for the policy entity graph.
//!
//! Each store owns a `RwLock<HashMap>` keyed by a monotonically allocated id.
//! Relationships between entities are id references resolved through the
//! stores — no embedded back-pointers, no ownership cycles. Mutation is
//! synchronous; callers (the engine) validate before committing so a failed
//! save never touches a store.

mod catalog;
mod filters;
mod nodes;
mod rules;

pub use catalog::CatalogStore;
pub use filters::FilterStore;
pub use nodes::NodeStore;
pub use rules::RuleStore;

use std::collections::HashMap;
use std::sync::RwLock;

use gridgate_core::ProjectId;

/// Registry of project scopes.
pub struct ProjectStore {
    inner: RwLock<ProjectInner>,
}

struct ProjectInner {
    next_id: u64,
    projects: HashMap<ProjectId, String>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ProjectInner {
                next_id: 1,
                projects: HashMap::new(),
            }),
        }
    }

    pub fn create(&self, name: impl Into<String>) -> ProjectId {
        let mut inner = self.inner.write().expect("project store lock poisoned");
        let id = ProjectId(inner.next_id);
        inner.next_id += 1;
        inner.projects.insert(id, name.into());
        id
    }

    pub fn exists(&self, id: ProjectId) -> bool {
        self.inner
            .read()
            .expect("project store lock poisoned")
            .projects
            .contains_key(&id)
    }

    pub fn name(&self, id: ProjectId) -> Option<String> {
        self.inner
            .read()
            .expect("project store lock poisoned")
            .projects
            .get(&id)
            .cloned()
    }
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}
