//! Configuration editor
//!
//! The facade a UI talks to. It owns the active scope (the network, or a set
//! of selected nodes), one layer stack and one draft per scope unit, and runs
//! commits. Reads and edits are synchronous; only loading and submitting
//! await.
//!
//! In node scope every edit is applied to each selected node. A node that is
//! deselected keeps its draft until the scope is switched.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use netcfg_types::layer_adapter::LayerAdapter;
use serde::Serialize;

use crate::commit::{
	CommitCoordinator, CommitError, CommitSummary, CommitTicket, CommitUnit, InFlightLock,
	InFlightScopes, StaleScopeError,
};
use crate::draft::{DraftManager, DraftValue};
use crate::layer_stack::LayerStack;
use crate::prelude::*;
use crate::resolve::{self, DisplayValue};
use crate::review::Review;
use crate::settings::{FrozenSettingsRegistry, SettingDefinition};

/// Everything an input field needs to render one path
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputData {
	pub path: Path,
	pub effective_value: DisplayValue,
	/// Layer the effective value comes from
	pub source: Option<LayerId>,
	/// The editable layer (with the draft applied) holds a value here
	pub is_overridden: bool,
	pub is_draft: bool,
	pub is_reverted: bool,
	/// What applies once the override is gone
	pub fallback_value: Option<Scalar>,
	#[serde(skip)]
	pub definition: Option<SettingDefinition>,
}

impl InputData {
	/// State of a feature toggle. Without a value anywhere the definition's
	/// default applies.
	pub fn is_enabled(&self) -> bool {
		match &self.effective_value {
			DisplayValue::Value(Scalar::Bool(enabled)) => *enabled,
			DisplayValue::Value(value) => value.to_string() == "true",
			DisplayValue::Unset => self.definition.as_ref().is_some_and(|def| def.default_enabled),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
	Closed,
	Network,
	Nodes,
}

#[derive(Debug)]
struct ScopeUnit {
	stack: LayerStack,
	draft: DraftManager,
}

impl ScopeUnit {
	fn new(stack: LayerStack) -> Self {
		let draft = DraftManager::new(stack.editable_tree().clone());
		Self { stack, draft }
	}

	fn input(&self, path: &Path, registry: &FrozenSettingsRegistry) -> InputData {
		let values = self.stack.values_at(path);
		let editable = self.stack.editable_index();
		let resolution = resolve::resolve(&values, editable, self.draft.get(path));
		let layer_id = |idx: usize| self.stack.layers().get(idx).map(|layer| layer.id);

		let definition = registry.get_path(path).cloned();
		if definition.is_none() {
			debug!("No definition for '{}', rendering as free text", path);
		}

		InputData {
			effective_value: resolution.display_value,
			source: resolution.source_layer_index.and_then(layer_id),
			is_overridden: self.draft.config_with_changes().get_scalar(path).is_some(),
			is_draft: resolution.is_draft,
			is_reverted: resolution.is_reverted,
			fallback_value: resolve::fallback(&values, editable).map(|(_, value)| value),
			definition,
			path: path.clone(),
		}
	}

	fn commit_unit(&self) -> CommitUnit {
		CommitUnit {
			scope: self.stack.scope().clone(),
			tree: self.draft.config_with_changes().clone(),
			changed_paths: self.draft.changed_paths(),
			entries: self.draft.entries().clone(),
		}
	}
}

#[derive(Debug)]
pub struct ConfigEditor {
	adapter: Arc<dyn LayerAdapter>,
	registry: Arc<FrozenSettingsRegistry>,
	mode: Mode,
	network: Option<ScopeUnit>,
	nodes: BTreeMap<NodeId, ScopeUnit>,
	selected: Vec<NodeId>,
	/// Bumped on every scope switch; commit outcomes carry the value they
	/// were prepared under
	generation: u64,
	/// Scopes of the current generation held by a live ticket
	in_flight: InFlightScopes,
	load_error: Option<String>,
}

impl ConfigEditor {
	pub fn new(adapter: Arc<dyn LayerAdapter>, registry: Arc<FrozenSettingsRegistry>) -> Self {
		Self {
			adapter,
			registry,
			mode: Mode::Closed,
			network: None,
			nodes: BTreeMap::new(),
			selected: Vec::new(),
			generation: 0,
			in_flight: InFlightScopes::default(),
			load_error: None,
		}
	}

	fn switch(&mut self, mode: Mode) {
		self.generation += 1;
		self.mode = mode;
		self.network = None;
		self.nodes.clear();
		self.selected.clear();
		self.in_flight = InFlightScopes::default();
		self.load_error = None;
	}

	fn record_load_error(&mut self, scope: &Scope, err: &Error) {
		warn!("Failed to load layers for {}: {}", scope, err);
		self.load_error = Some(format!("{}: {}", scope, err));
	}

	// Scope //
	//*******//
	/// Make the network the active scope, dropping every draft
	pub async fn open_network(&mut self) -> NcResult<()> {
		self.switch(Mode::Network);
		match LayerStack::load(&self.adapter, &Scope::Network).await {
			Ok(stack) => {
				self.network = Some(ScopeUnit::new(stack));
				info!("Opened network scope");
				Ok(())
			}
			Err(err) => {
				self.record_load_error(&Scope::Network, &err);
				Err(err)
			}
		}
	}

	/// Make node scope active with the given selection, dropping every draft
	pub async fn open_nodes(&mut self, nodes: &[NodeId]) -> NcResult<()> {
		self.switch(Mode::Nodes);
		self.select_nodes(nodes).await
	}

	/// Change the node selection. Newly selected nodes are loaded; nodes that
	/// drop out keep their drafts.
	pub async fn select_nodes(&mut self, nodes: &[NodeId]) -> NcResult<()> {
		if self.mode != Mode::Nodes {
			return Err(Error::ConfigError("node selection requires node scope".into()));
		}

		for node in nodes {
			if self.nodes.contains_key(node) {
				continue;
			}
			let scope = Scope::Node(node.clone());
			match LayerStack::load(&self.adapter, &scope).await {
				Ok(stack) => {
					self.nodes.insert(node.clone(), ScopeUnit::new(stack));
				}
				Err(err) => {
					self.record_load_error(&scope, &err);
					return Err(err);
				}
			}
		}

		self.selected.clear();
		for node in nodes {
			if !self.selected.contains(node) {
				self.selected.push(node.clone());
			}
		}
		debug!("Selected {} node(s)", self.selected.len());
		Ok(())
	}

	/// Leave the active scope, dropping every draft
	pub fn close(&mut self) {
		self.switch(Mode::Closed);
	}

	/// The scope whose values are shown: the network, or the first selected node
	pub fn focused_scope(&self) -> Option<Scope> {
		match self.mode {
			Mode::Closed => None,
			Mode::Network => self.network.as_ref().map(|_| Scope::Network),
			Mode::Nodes => self.selected.first().map(|node| Scope::Node(node.clone())),
		}
	}

	/// Scopes edits are applied to
	pub fn active_scopes(&self) -> Vec<Scope> {
		match self.mode {
			Mode::Closed => Vec::new(),
			Mode::Network => self.network.iter().map(|_| Scope::Network).collect(),
			Mode::Nodes => self.selected.iter().map(|node| Scope::Node(node.clone())).collect(),
		}
	}

	pub fn selected_nodes(&self) -> &[NodeId] {
		&self.selected
	}

	/// Reason the last scope load failed, if it did
	pub fn load_error(&self) -> Option<&str> {
		self.load_error.as_deref()
	}

	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// Some scope has a live commit ticket
	pub fn is_commit_in_flight(&self) -> bool {
		!self.in_flight.lock().is_empty()
	}

	pub fn is_scope_in_flight(&self, scope: &Scope) -> bool {
		self.in_flight.lock().contains(scope)
	}

	fn unit(&self, scope: &Scope) -> Option<&ScopeUnit> {
		match scope {
			Scope::Network => self.network.as_ref().filter(|_| self.mode == Mode::Network),
			Scope::Node(node) => self.nodes.get(node).filter(|_| self.mode == Mode::Nodes),
		}
	}

	fn unit_mut(&mut self, scope: &Scope) -> Option<&mut ScopeUnit> {
		match (scope, self.mode) {
			(Scope::Network, Mode::Network) => self.network.as_mut(),
			(Scope::Node(node), Mode::Nodes) => self.nodes.get_mut(node),
			_ => None,
		}
	}

	fn focused_unit(&self) -> Option<&ScopeUnit> {
		self.focused_scope().and_then(|scope| self.unit(&scope))
	}

	fn for_each_active(&mut self, mut f: impl FnMut(&mut DraftManager)) -> NcResult<()> {
		match self.mode {
			Mode::Closed => Err(Error::ConfigError("no scope is open".into())),
			Mode::Network => {
				let unit = self
					.network
					.as_mut()
					.ok_or_else(|| Error::ConfigError("network scope is not loaded".into()))?;
				f(&mut unit.draft);
				Ok(())
			}
			Mode::Nodes => {
				if self.selected.is_empty() {
					return Err(Error::ConfigError("no node is selected".into()));
				}
				for node in &self.selected {
					if let Some(unit) = self.nodes.get_mut(node) {
						f(&mut unit.draft);
					}
				}
				Ok(())
			}
		}
	}

	// Views //
	//*******//
	/// Layers of the focused scope, lowest precedence first
	pub fn layers(&self) -> Option<&[Layer]> {
		self.focused_unit().map(|unit| unit.stack.layers())
	}

	pub fn layers_for(&self, node: &NodeId) -> Option<&[Layer]> {
		self.unit(&Scope::Node(node.clone())).map(|unit| unit.stack.layers())
	}

	/// Input state of `path` in the focused scope
	pub fn input(&self, path: &Path) -> Option<InputData> {
		self.focused_unit().map(|unit| unit.input(path, &self.registry))
	}

	pub fn input_for(&self, scope: &Scope, path: &Path) -> Option<InputData> {
		self.unit(scope).map(|unit| unit.input(path, &self.registry))
	}

	/// Editable layer of a scope with its draft applied
	pub fn config_with_changes(&self, scope: &Scope) -> Option<&ConfigTree> {
		self.unit(scope).map(|unit| unit.draft.config_with_changes())
	}

	pub fn draft_entries(&self, scope: &Scope) -> Option<&BTreeMap<Path, DraftValue>> {
		self.unit(scope).map(|unit| unit.draft.entries())
	}

	/// Effective configuration of a scope (committed layers plus the draft)
	pub fn effective_tree(&self, scope: &Scope) -> Option<ConfigTree> {
		self.unit(scope).map(|unit| {
			let mut stack = unit.stack.clone();
			stack.promote(unit.draft.config_with_changes().clone());
			stack.effective_tree()
		})
	}

	// Edits //
	//*******//
	pub fn edit(&mut self, path: &Path, value: impl Into<Scalar>) -> NcResult<()> {
		let value = value.into();
		self.for_each_active(|draft| draft.edit(path, value.clone()))
	}

	/// Edit a single node's draft regardless of the selection
	pub fn edit_node(&mut self, node: &NodeId, path: &Path, value: impl Into<Scalar>) -> NcResult<()> {
		let unit = self.unit_mut(&Scope::Node(node.clone())).ok_or(Error::NotFound)?;
		unit.draft.edit(path, value.into());
		Ok(())
	}

	/// Apply raw input text. Blank input removes the override; typed values
	/// that do not parse are kept as text so validation reports them.
	pub fn change(&mut self, path: &Path, raw: &str) -> NcResult<()> {
		if raw.trim().is_empty() {
			return self.revert(path);
		}
		let value = match self.registry.get_path(path) {
			Some(def) => def.data_type.parse_raw(raw),
			None => Scalar::from(raw),
		};
		self.edit(path, value)
	}

	pub fn revert(&mut self, path: &Path) -> NcResult<()> {
		self.for_each_active(|draft| draft.revert(path))
	}

	pub fn undo_edit(&mut self, path: &Path) -> NcResult<()> {
		self.for_each_active(|draft| draft.undo_edit(path))
	}

	pub fn undo_revert(&mut self, path: &Path) -> NcResult<()> {
		self.for_each_active(|draft| draft.undo_revert(path))
	}

	/// Discard the drafts of the active scopes
	pub fn reset(&mut self) -> NcResult<()> {
		self.for_each_active(DraftManager::reset)
	}

	// Review //
	//********//
	/// Changed paths across the active scopes
	pub fn changed_paths(&self) -> BTreeSet<Path> {
		self.active_scopes()
			.iter()
			.filter_map(|scope| self.unit(scope))
			.flat_map(|unit| unit.draft.changed_paths())
			.collect()
	}

	/// Changed paths of every loaded scope unit, deselected nodes included
	pub fn pending_changes(&self) -> BTreeMap<Scope, BTreeSet<Path>> {
		self.network
			.iter()
			.chain(self.nodes.values())
			.map(|unit| (unit.stack.scope().clone(), unit.draft.changed_paths()))
			.filter(|(_, paths)| !paths.is_empty())
			.collect()
	}

	/// Old and new values of every change in the active scopes
	pub fn review(&self) -> Vec<Review> {
		self.active_scopes()
			.iter()
			.filter_map(|scope| self.unit(scope))
			.map(|unit| {
				Review::build(
					unit.stack.scope().clone(),
					unit.draft.snapshot(),
					unit.draft.config_with_changes(),
					&self.registry,
				)
			})
			.filter(|review| !review.is_empty())
			.collect()
	}

	// Commit //
	//********//
	fn prepare(&mut self, scopes: BTreeSet<Scope>) -> Result<Option<CommitTicket>, CommitError> {
		let mut units: Vec<CommitUnit> = Vec::new();
		let mut settled = Vec::new();
		for scope in &scopes {
			let Some(unit) = self.unit(scope).filter(|unit| !unit.draft.is_empty()) else {
				continue;
			};
			let commit_unit = unit.commit_unit();
			if commit_unit.changed_paths.is_empty() {
				settled.push(commit_unit.scope);
			} else {
				units.push(commit_unit);
			}
		}

		if let Some(unit) = units.iter().find(|unit| self.is_scope_in_flight(&unit.scope)) {
			return Err(CommitError::InFlight(unit.scope.clone()));
		}

		// Drafts that change nothing are settled without a round trip
		for scope in &settled {
			if let Some(unit) = self.unit_mut(scope) {
				debug!("Dropping draft of {} with no effective change", scope);
				unit.draft.reset();
			}
		}
		if units.is_empty() {
			return Ok(None);
		}

		let scopes = units.iter().map(|unit| unit.scope.clone()).collect();
		let lock = InFlightLock::acquire(&self.in_flight, scopes);
		Ok(Some(CommitTicket { generation: self.generation, units, lock: Some(lock) }))
	}

	/// Freeze the drafts of the active scopes for submission. `None` when
	/// there is nothing to commit. Fails with `InFlight` if one of the scopes
	/// is held by a live ticket.
	pub fn prepare_commit(&mut self) -> Result<Option<CommitTicket>, CommitError> {
		let scopes = self.active_scopes().into_iter().collect();
		self.prepare(scopes)
	}

	/// Like `prepare_commit`, restricted to some of the loaded nodes
	pub fn prepare_commit_nodes(
		&mut self,
		nodes: &[NodeId],
	) -> Result<Option<CommitTicket>, CommitError> {
		let scopes = nodes.iter().map(|node| Scope::Node(node.clone())).collect();
		self.prepare(scopes)
	}

	/// Apply the outcome of a submitted ticket. On success the submitted trees
	/// become the committed editable layers and the settled draft entries are
	/// dropped; on failure nothing changes.
	pub fn finish_commit(
		&mut self,
		ticket: CommitTicket,
		result: Result<(), CommitError>,
	) -> Result<CommitSummary, CommitError> {
		if ticket.generation != self.generation {
			debug!(
				"Discarding commit outcome for generation {} (now {})",
				ticket.generation, self.generation
			);
			return Err(StaleScopeError { generation: ticket.generation, current: self.generation }.into());
		}
		result?;

		let mut summary = CommitSummary::default();
		for unit in ticket.units {
			let Some(target) = self.unit_mut(&unit.scope) else {
				warn!("Committed scope {} is no longer loaded", unit.scope);
				continue;
			};
			target.stack.promote(unit.tree.clone());
			target.draft.commit(unit.tree, &unit.entries);

			for path in &unit.changed_paths {
				if self.registry.requires_restart(&path.to_string()) {
					summary.restart_required.insert(path.clone());
				}
			}
			summary.committed.insert(unit.scope, unit.changed_paths);
		}
		if !summary.restart_required.is_empty() {
			info!("{} committed setting(s) require a restart", summary.restart_required.len());
		}
		Ok(summary)
	}

	/// Validate and submit the drafts of the active scopes
	pub async fn submit(
		&mut self,
		coordinator: &CommitCoordinator,
	) -> Result<Option<CommitSummary>, CommitError> {
		let Some(ticket) = self.prepare_commit()? else {
			return Ok(None);
		};
		let result = coordinator.submit(&ticket).await;
		self.finish_commit(ticket, result).map(Some)
	}
}


// vim: ts=4
