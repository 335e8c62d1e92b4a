//! Policy rule store.

use std::collections::HashMap;
use std::sync::RwLock;

use gridgate_core::{ProjectId, RuleId};

use crate::error::{PolicyError, Result};
use crate::model::PolicyRule;

pub struct RuleStore {
    inner: RwLock<Inner>,
}

struct Inner {
    next_id: u64,
    rules: HashMap<RuleId, PolicyRule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                next_id: 1,
                rules: HashMap::new(),
            }),
        }
    }

    /// Insert a new rule, assigning its id. Returns the stored copy.
    pub fn insert(&self, mut rule: PolicyRule) -> PolicyRule {
        let mut inner = self.inner.write().expect("rule store lock poisoned");
        rule.id = RuleId(inner.next_id);
        inner.next_id += 1;
        inner.rules.insert(rule.id, rule.clone());
        rule
    }

    /// Replace an existing rule.
    pub fn update(&self, mut rule: PolicyRule) -> Result<PolicyRule> {
        let mut inner = self.inner.write().expect("rule store lock poisoned");
        if !inner.rules.contains_key(&rule.id) {
            return Err(PolicyError::RuleNotFound(rule.id));
        }
        rule.touch();
        inner.rules.insert(rule.id, rule.clone());
        Ok(rule)
    }

    pub fn get(&self, id: RuleId) -> Option<PolicyRule> {
        self.inner
            .read()
            .expect("rule store lock poisoned")
            .rules
            .get(&id)
            .cloned()
    }

    pub fn remove(&self, id: RuleId) -> Option<PolicyRule> {
        self.inner
            .write()
            .expect("rule store lock poisoned")
            .rules
            .remove(&id)
    }

    /// Unordered project rules; callers apply ranking.
    pub fn list_by_project(&self, project: ProjectId) -> Vec<PolicyRule> {
        self.inner
            .read()
            .expect("rule store lock poisoned")
            .rules
            .values()
            .filter(|r| r.project == project)
            .cloned()
            .collect()
    }

    /// `(id, name)` pairs of the project's rules, for uniqueness checks.
    pub fn names_in_project(&self, project: ProjectId) -> Vec<(RuleId, String)> {
        self.inner
            .read()
            .expect("rule store lock poisoned")
            .rules
            .values()
            .filter(|r| r.project == project)
            .map(|r| (r.id, r.name.clone()))
            .collect()
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}
