//! The policy engine: the single write path for the entity graph.
//!
//! Every collaborator (stores, protocol parser, optional calculated-value
//! pass) is injected through the constructor. Saves are all-or-nothing:
//! validation runs against resolved references first, and a failing result
//! aborts before any store is touched.

use std::ops::RangeInclusive;

use tracing::{debug, info, warn};

use gridgate_core::{Config, FilterId, NodeId, ProjectId, RuleId};

use crate::compiler::{self, CalculatedValuePass, CompileOutcome, RuleRefs};
use crate::error::{PolicyError, Result};
use crate::model::{Action, Node, NodeConfig, PolicyRule, ProtocolFilter, Trigger};
use crate::protocol::{ProtocolParser, ProtocolSummary};
use crate::ranking;
use crate::runtime::{RuntimeControl, RuntimeStatus};
use crate::store::{CatalogStore, FilterStore, NodeStore, ProjectStore, RuleStore};
use crate::validation::{
    validate_filter, validate_rule, FieldWarning, FilterValidationContext, RuleValidationContext,
};

/// A successful save plus any advisory warnings it produced.
#[derive(Debug)]
pub struct SaveReport<T> {
    pub entity: T,
    pub warnings: Vec<FieldWarning>,
}

pub struct PolicyEngine {
    config: Config,
    projects: ProjectStore,
    nodes: NodeStore,
    filters: FilterStore,
    catalog: CatalogStore,
    rules: RuleStore,
    parser: Box<dyn ProtocolParser>,
    calculated_value_pass: Option<Box<dyn CalculatedValuePass>>,
    runtime: Option<Box<dyn RuntimeControl>>,
}

impl PolicyEngine {
    pub fn new(config: Config, parser: Box<dyn ProtocolParser>) -> Self {
        Self {
            config,
            projects: ProjectStore::new(),
            nodes: NodeStore::new(),
            filters: FilterStore::new(),
            catalog: CatalogStore::new(),
            rules: RuleStore::new(),
            parser,
            calculated_value_pass: None,
            runtime: None,
        }
    }

    /// Install a pre-compilation pass for derived values.
    pub fn with_calculated_value_pass(mut self, pass: Box<dyn CalculatedValuePass>) -> Self {
        self.calculated_value_pass = Some(pass);
        self
    }

    /// Attach a control handle for the external execution runtime. When
    /// present, [`apply_policy`](Self::apply_policy) restarts the runtime
    /// after writing the artifact so it picks up the new policy.
    pub fn with_runtime(mut self, runtime: Box<dyn RuntimeControl>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Status of the external runtime, if a control handle is attached.
    pub fn runtime_status(&self) -> Option<RuntimeStatus> {
        self.runtime.as_ref().map(|r| r.status())
    }

    // ── Projects ──────────────────────────────────────────────

    pub fn create_project(&self, name: impl Into<String>) -> ProjectId {
        let name = name.into();
        let id = self.projects.create(name.clone());
        info!(project = %id, name = %name, "created project");
        id
    }

    pub fn project_name(&self, id: ProjectId) -> Option<String> {
        self.projects.name(id)
    }

    // ── Nodes ─────────────────────────────────────────────────

    pub fn add_node(
        &self,
        project: ProjectId,
        name: impl Into<String>,
        config: NodeConfig,
    ) -> Result<Node> {
        if !self.projects.exists(project) {
            return Err(PolicyError::ProjectNotFound(project));
        }
        let node = self.nodes.insert(Node::new(project, name, config));
        info!(node = %node.id, name = %node.name, kind = %node.kind(), "added node");
        Ok(node)
    }

    pub fn get_node(&self, id: NodeId) -> Result<Node> {
        self.nodes.get(id).ok_or(PolicyError::NodeNotFound(id))
    }

    pub fn update_node(&self, node: Node) -> Result<Node> {
        self.nodes.update(node)
    }

    pub fn list_nodes(&self, project: ProjectId) -> Vec<Node> {
        self.nodes.list_by_project(project)
    }

    /// Delete a node. Refused while any rule still references the node
    /// directly or through one of its filters; otherwise the node's filters
    /// are deleted with it.
    pub fn delete_node(&self, id: NodeId) -> Result<()> {
        let node = self.get_node(id)?;
        let owned_filters: Vec<FilterId> = self
            .filters
            .list_by_parent_node(id)
            .into_iter()
            .map(|f| f.id)
            .collect();

        let referencing: Vec<String> = self
            .rules
            .list_by_project(node.project)
            .into_iter()
            .filter(|r| {
                r.source_node == Some(id)
                    || r.destination_node == Some(id)
                    || r.filter.map_or(false, |f| owned_filters.contains(&f))
            })
            .map(|r| format!("rule '{}' ({})", r.name, r.id))
            .collect();
        if !referencing.is_empty() {
            return Err(PolicyError::ReferencedBy {
                entity: format!("node '{}'", node.name),
                references: referencing.join(", "),
            });
        }

        let cascaded = self.filters.remove_by_parent_node(id);
        self.nodes.remove(id);
        info!(node = %id, cascaded_filters = cascaded, "deleted node");
        Ok(())
    }

    // ── Protocol ingestion ────────────────────────────────────

    /// Accept an uploaded protocol-definition file for a node. Oversized
    /// content and unknown extensions are rejected outright; parse failures
    /// are stored as an ERROR summary and reported, not raised.
    pub fn ingest_protocol(
        &self,
        node_id: NodeId,
        file_name: &str,
        content: String,
    ) -> Result<ProtocolSummary> {
        let mut node = self.get_node(node_id)?;

        let size = content.len() as u64;
        if size > self.config.protocol.max_file_bytes {
            return Err(PolicyError::Ingest(format!(
                "file is {size} bytes, limit is {} bytes",
                self.config.protocol.max_file_bytes
            )));
        }
        let expected = self.parser.file_extension();
        let extension = file_name.rsplit('.').next().unwrap_or("");
        if !extension.eq_ignore_ascii_case(expected) {
            return Err(PolicyError::Ingest(format!(
                "unsupported file extension '.{extension}', expected '.{expected}'"
            )));
        }

        let summary = match self.parser.extract_variables(&content) {
            Ok(variables) => ProtocolSummary::parsed(variables.len(), size),
            Err(message) => {
                warn!(node = %node_id, error = %message, "protocol parse failed");
                ProtocolSummary::error(message, size)
            }
        };

        node.protocol.content = Some(content);
        node.protocol.summary = summary.clone();
        self.nodes.update(node)?;
        info!(node = %node_id, status = ?summary.status, "ingested protocol file");
        Ok(summary)
    }

    /// Remove a node's protocol definition, resetting its summary to NO_FILE.
    pub fn clear_protocol(&self, node_id: NodeId) -> Result<ProtocolSummary> {
        let mut node = self.get_node(node_id)?;
        node.protocol.content = None;
        node.protocol.summary = ProtocolSummary::no_file();
        let summary = node.protocol.summary.clone();
        self.nodes.update(node)?;
        Ok(summary)
    }

    // ── Catalog ───────────────────────────────────────────────

    pub fn add_trigger(&self, project: ProjectId, name: impl Into<String>) -> Result<Trigger> {
        if !self.projects.exists(project) {
            return Err(PolicyError::ProjectNotFound(project));
        }
        Ok(self.catalog.insert_trigger(Trigger::new(project, name)))
    }

    pub fn add_action(&self, project: ProjectId, name: impl Into<String>) -> Result<Action> {
        if !self.projects.exists(project) {
            return Err(PolicyError::ProjectNotFound(project));
        }
        Ok(self.catalog.insert_action(Action::new(project, name)))
    }

    // ── Filters ───────────────────────────────────────────────

    /// Validate and persist a filter; insert when unsaved, replace otherwise.
    pub fn save_filter(&self, filter: ProtocolFilter) -> Result<ProtocolFilter> {
        let parent = self.nodes.get(filter.parent_node);
        let sibling_names = self
            .filters
            .list_by_parent_node(filter.parent_node)
            .into_iter()
            .map(|f| (f.id, f.name))
            .collect();
        let ctx = FilterValidationContext {
            parent,
            sibling_names,
        };
        let result = validate_filter(&filter, &ctx);
        if !result.valid {
            return Err(PolicyError::Validation(result.errors));
        }
        let saved = if filter.id.is_persisted() {
            self.filters.update(filter)?
        } else {
            self.filters.insert(filter)
        };
        debug!(filter = %saved.id, name = %saved.name, "saved filter");
        Ok(saved)
    }

    /// Delete a filter. Refused while a rule still references it.
    pub fn delete_filter(&self, id: FilterId) -> Result<()> {
        let filter = self
            .filters
            .get(id)
            .ok_or(PolicyError::FilterNotFound(id))?;
        let project = self
            .nodes
            .get(filter.parent_node)
            .map(|n| n.project);
        if let Some(project) = project {
            let referencing: Vec<String> = self
                .rules
                .list_by_project(project)
                .into_iter()
                .filter(|r| r.filter == Some(id))
                .map(|r| format!("rule '{}' ({})", r.name, r.id))
                .collect();
            if !referencing.is_empty() {
                return Err(PolicyError::ReferencedBy {
                    entity: format!("filter '{}'", filter.name),
                    references: referencing.join(", "),
                });
            }
        }
        self.filters.remove(id);
        Ok(())
    }

    pub fn list_filters(&self, node: NodeId) -> Vec<ProtocolFilter> {
        self.filters.list_by_parent_node(node)
    }

    pub fn default_filter_name(&self, node: NodeId) -> Result<String> {
        let node = self.get_node(node)?;
        Ok(self.filters.default_filter_name(&node))
    }

    /// Protocol variables a filter on this node may reference.
    pub fn variable_candidates(
        &self,
        node: NodeId,
        existing_filter: Option<FilterId>,
    ) -> Result<Vec<String>> {
        let node = self.get_node(node)?;
        Ok(self
            .filters
            .resolve_variable_candidates(&node, existing_filter, self.parser.as_ref()))
    }

    // ── Rules ─────────────────────────────────────────────────

    /// Validate and persist a rule. Errors abort before the store is touched;
    /// warnings (completeness, advisory) are returned alongside the saved
    /// copy and logged.
    ///
    /// The uniqueness check and the insert run under separate store locks:
    /// two concurrent saves of the same name can both pass validation and
    /// land as duplicates. Mutation is request-scoped and last-writer-wins,
    /// so this is accepted rather than serialized here.
    pub fn save_rule(&self, rule: PolicyRule) -> Result<SaveReport<PolicyRule>> {
        let ctx = self.resolve_rule_context(&rule);
        let result = validate_rule(&rule, &ctx);
        if !result.valid {
            debug!(rule = %rule.name, errors = result.errors.len(), "rule validation failed");
            return Err(PolicyError::Validation(result.errors));
        }
        for warning in &result.warnings {
            warn!(rule = %rule.name, path = %warning.path, "{}", warning.message);
        }
        let saved = if rule.id.is_persisted() {
            self.rules.update(rule)?
        } else {
            self.rules.insert(rule)
        };
        info!(rule = %saved.id, name = %saved.name, active = saved.active, "saved rule");
        Ok(SaveReport {
            entity: saved,
            warnings: result.warnings,
        })
    }

    pub fn get_rule(&self, id: RuleId) -> Result<PolicyRule> {
        self.rules.get(id).ok_or(PolicyError::RuleNotFound(id))
    }

    pub fn delete_rule(&self, id: RuleId) -> Result<()> {
        self.rules.remove(id).ok_or(PolicyError::RuleNotFound(id))?;
        info!(rule = %id, "deleted rule");
        Ok(())
    }

    /// Project rules in evaluation order.
    pub fn list_rules(&self, project: ProjectId) -> Vec<PolicyRule> {
        let mut rules = self.rules.list_by_project(project);
        ranking::rank(&mut rules);
        rules
    }

    /// Ranked rules whose execution order falls within `range`, inclusive.
    pub fn list_by_execution_order_range(
        &self,
        project: ProjectId,
        range: RangeInclusive<i32>,
    ) -> Vec<PolicyRule> {
        let mut rules = self.rules.list_by_project(project);
        ranking::filter_by_execution_order(&mut rules, range);
        rules
    }

    fn resolve_rule_context(&self, rule: &PolicyRule) -> RuleValidationContext {
        let filter = rule.filter.and_then(|id| self.filters.get(id));
        let filter_parent = filter
            .as_ref()
            .and_then(|f| self.nodes.get(f.parent_node));
        RuleValidationContext {
            project_exists: self.projects.exists(rule.project),
            source: rule.source_node.and_then(|id| self.nodes.get(id)),
            destination: rule.destination_node.and_then(|id| self.nodes.get(id)),
            trigger: rule.trigger.and_then(|id| self.catalog.get_trigger(id)),
            actions: rule
                .actions
                .iter()
                .map(|&id| (id, self.catalog.get_action(id)))
                .collect(),
            filter,
            filter_parent,
            sibling_names: self.rules.names_in_project(rule.project),
        }
    }

    fn resolve_rule_refs(&self, rule: &PolicyRule) -> RuleRefs {
        RuleRefs {
            source: rule.source_node.and_then(|id| self.nodes.get(id)),
            destination: rule.destination_node.and_then(|id| self.nodes.get(id)),
            trigger: rule.trigger.and_then(|id| self.catalog.get_trigger(id)),
            filter: rule.filter.and_then(|id| self.filters.get(id)),
            actions: rule
                .actions
                .iter()
                .filter_map(|&id| self.catalog.get_action(id))
                .collect(),
        }
    }

    // ── Compilation ───────────────────────────────────────────

    /// Compile the project's full rule set, in evaluation order, into the
    /// canonical document. Incomplete rules are collected as failures; strict
    /// mode turns any failure into an error.
    pub fn compile_project(&self, project: ProjectId, strict: bool) -> Result<CompileOutcome> {
        if !self.projects.exists(project) {
            return Err(PolicyError::ProjectNotFound(project));
        }
        let mut rules = self.list_rules(project);
        if let Some(pass) = &self.calculated_value_pass {
            pass.run(&mut rules)?;
        }
        compiler::compile_batch(&rules, |rule| self.resolve_rule_refs(rule), strict)
    }

    /// Compile and write the artifact to the configured path, then signal the
    /// attached runtime (if any) to restart on the new policy. A refused
    /// restart is logged, not raised: the artifact is already in place.
    pub fn apply_policy(&self, project: ProjectId, strict: bool) -> Result<CompileOutcome> {
        let outcome = self.compile_project(project, strict)?;
        compiler::write_artifact(&outcome.document, &self.config.artifact.path)?;
        if let Some(runtime) = &self.runtime {
            if let Err(e) = runtime.restart() {
                warn!(error = %e, "runtime restart refused after policy apply");
            }
        }
        Ok(outcome)
    }
}
