//! Trigger/action catalog: thin, mostly pass-through storage.

use std::collections::HashMap;
use std::sync::RwLock;

use gridgate_core::{ActionId, ProjectId, TriggerId};

use crate::model::{Action, Trigger};

pub struct CatalogStore {
    inner: RwLock<Inner>,
}

struct Inner {
    next_trigger_id: u64,
    next_action_id: u64,
    triggers: HashMap<TriggerId, Trigger>,
    actions: HashMap<ActionId, Action>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_trigger_id: 1,
                next_action_id: 1,
                triggers: HashMap::new(),
                actions: HashMap::new(),
            }),
        }
    }

    pub fn insert_trigger(&self, mut trigger: Trigger) -> Trigger {
        let mut inner = self.inner.write().expect("catalog store lock poisoned");
        trigger.id = TriggerId(inner.next_trigger_id);
        inner.next_trigger_id += 1;
        inner.triggers.insert(trigger.id, trigger.clone());
        trigger
    }

    pub fn insert_action(&self, mut action: Action) -> Action {
        let mut inner = self.inner.write().expect("catalog store lock poisoned");
        action.id = ActionId(inner.next_action_id);
        inner.next_action_id += 1;
        inner.actions.insert(action.id, action.clone());
        action
    }

    pub fn get_trigger(&self, id: TriggerId) -> Option<Trigger> {
        self.inner
            .read()
            .expect("catalog store lock poisoned")
            .triggers
            .get(&id)
            .cloned()
    }

    pub fn get_action(&self, id: ActionId) -> Option<Action> {
        self.inner
            .read()
            .expect("catalog store lock poisoned")
            .actions
            .get(&id)
            .cloned()
    }

    pub fn list_triggers(&self, project: ProjectId) -> Vec<Trigger> {
        let inner = self.inner.read().expect("catalog store lock poisoned");
        let mut triggers: Vec<Trigger> = inner
            .triggers
            .values()
            .filter(|t| t.project == project)
            .cloned()
            .collect();
        triggers.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        triggers
    }

    pub fn list_actions(&self, project: ProjectId) -> Vec<Action> {
        let inner = self.inner.read().expect("catalog store lock poisoned");
        let mut actions: Vec<Action> = inner
            .actions
            .values()
            .filter(|a| a.project == project)
            .cloned()
            .collect();
        actions.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        actions
    }
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self::new()
    }
}
