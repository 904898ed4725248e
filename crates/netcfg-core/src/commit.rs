//! Commit validation and submission
//!
//! A commit runs in three steps so the editor is never borrowed across I/O:
//! the editor prepares a [`CommitTicket`], the coordinator validates and
//! submits it, and the editor applies the outcome. A ticket carries the scope
//! generation it was prepared for; outcomes for an older generation are stale
//! and dropped. While a ticket is alive its scopes count as in flight.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use netcfg_types::layer_adapter::{LayerAdapter, OverrideSubmission};

use crate::draft::DraftValue;
use crate::prelude::*;
use crate::settings::{FrozenSettingsRegistry, ValidationError};

// Errors //
//********//
/// The persistence collaborator rejected a submission
#[derive(Debug)]
pub struct PersistenceError {
	pub scopes: Vec<Scope>,
	pub cause: Error,
}

impl fmt::Display for PersistenceError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let scopes: Vec<String> = self.scopes.iter().map(ToString::to_string).collect();
		write!(f, "failed to persist {}: {}", scopes.join(", "), self.cause)
	}
}

impl std::error::Error for PersistenceError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.cause)
	}
}

/// A commit outcome arrived for a scope that is no longer active
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleScopeError {
	pub generation: u64,
	pub current: u64,
}

impl fmt::Display for StaleScopeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "stale commit for scope generation {} (now {})", self.generation, self.current)
	}
}

impl std::error::Error for StaleScopeError {}

#[derive(Debug)]
pub enum CommitError {
	/// Every field that failed validation; nothing was submitted
	Validation(Vec<ValidationError>),
	Persistence(PersistenceError),
	StaleScope(StaleScopeError),
	/// A commit for this scope is still outstanding
	InFlight(Scope),
}

impl fmt::Display for CommitError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CommitError::Validation(errors) => {
				write!(f, "validation failed for {} field(s)", errors.len())?;
				for err in errors {
					write!(f, "; {}", err)?;
				}
				Ok(())
			}
			CommitError::Persistence(err) => write!(f, "{}", err),
			CommitError::StaleScope(err) => write!(f, "{}", err),
			CommitError::InFlight(scope) => write!(f, "a commit for {} is already in flight", scope),
		}
	}
}

impl std::error::Error for CommitError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			CommitError::Persistence(err) => Some(err),
			CommitError::StaleScope(err) => Some(err),
			_ => None,
		}
	}
}

impl From<PersistenceError> for CommitError {
	fn from(err: PersistenceError) -> Self {
		Self::Persistence(err)
	}
}

impl From<StaleScopeError> for CommitError {
	fn from(err: StaleScopeError) -> Self {
		Self::StaleScope(err)
	}
}

// Tickets //
//*********//
/// The draft of one scope unit frozen for submission
#[derive(Debug, Clone)]
pub struct CommitUnit {
	pub scope: Scope,
	/// The editable layer as it will be stored
	pub tree: ConfigTree,
	pub changed_paths: BTreeSet<Path>,
	/// Draft entries this commit settles
	pub entries: BTreeMap<Path, DraftValue>,
}

/// Scopes with an outstanding commit
pub(crate) type InFlightScopes = Arc<Mutex<BTreeSet<Scope>>>;

/// Keeps the scopes of a ticket marked as in flight until it is dropped
#[derive(Debug)]
pub(crate) struct InFlightLock {
	scopes: Vec<Scope>,
	in_flight: InFlightScopes,
}

impl InFlightLock {
	pub(crate) fn acquire(in_flight: &InFlightScopes, scopes: Vec<Scope>) -> Self {
		in_flight.lock().extend(scopes.iter().cloned());
		Self { scopes, in_flight: in_flight.clone() }
	}
}

impl Drop for InFlightLock {
	fn drop(&mut self) {
		let mut in_flight = self.in_flight.lock();
		for scope in &self.scopes {
			in_flight.remove(scope);
		}
	}
}

/// A prepared commit. Dropping it, whether after `finish_commit` or because
/// the submit was abandoned or cancelled, releases its scopes.
#[derive(Debug)]
pub struct CommitTicket {
	pub(crate) generation: u64,
	pub units: Vec<CommitUnit>,
	pub(crate) lock: Option<InFlightLock>,
}

impl CommitTicket {
	pub fn generation(&self) -> u64 {
		self.generation
	}

	pub fn scopes(&self) -> Vec<Scope> {
		self.units.iter().map(|unit| unit.scope.clone()).collect()
	}

	/// What the persistence collaborator receives. Node units are sent as a
	/// per-node map so unlisted nodes are left alone.
	pub fn submission(&self) -> OverrideSubmission {
		let mut nodes = BTreeMap::new();
		for unit in &self.units {
			match &unit.scope {
				Scope::Network => return OverrideSubmission::Network(unit.tree.clone()),
				Scope::Node(id) => {
					nodes.insert(id.clone(), unit.tree.clone());
				}
			}
		}
		OverrideSubmission::Nodes(nodes)
	}
}

/// Outcome of an applied commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitSummary {
	pub committed: BTreeMap<Scope, BTreeSet<Path>>,
	/// Committed paths whose settings need a restart to take effect
	pub restart_required: BTreeSet<Path>,
}

// Coordinator //
//*************//
#[derive(Debug, Clone)]
pub struct CommitCoordinator {
	registry: Arc<FrozenSettingsRegistry>,
	adapter: Arc<dyn LayerAdapter>,
}

impl CommitCoordinator {
	pub fn new(registry: Arc<FrozenSettingsRegistry>, adapter: Arc<dyn LayerAdapter>) -> Self {
		Self { registry, adapter }
	}

	pub fn registry(&self) -> &Arc<FrozenSettingsRegistry> {
		&self.registry
	}

	/// Validate every changed path of every unit. A removed path is checked as
	/// a blank value.
	pub fn validate(&self, ticket: &CommitTicket) -> Result<(), Vec<ValidationError>> {
		let mut errors = Vec::new();
		for unit in &ticket.units {
			for path in &unit.changed_paths {
				let raw = unit.tree.get_scalar(path).map(ToString::to_string).unwrap_or_default();
				if let Err(reason) = self.registry.validate(&path.to_string(), &raw) {
					errors.push(ValidationError::new(path.clone(), reason).in_scope(unit.scope.clone()));
				}
			}
		}
		if errors.is_empty() { Ok(()) } else { Err(errors) }
	}

	/// Validate, then hand the ticket to the persistence collaborator
	pub async fn submit(&self, ticket: &CommitTicket) -> Result<(), CommitError> {
		if let Err(errors) = self.validate(ticket) {
			info!("Commit rejected: {} field(s) failed validation", errors.len());
			return Err(CommitError::Validation(errors));
		}

		let submission = ticket.submission();
		self.adapter.submit_overrides(&submission).await.map_err(|cause| {
			warn!("Failed to persist overrides: {}", cause);
			PersistenceError { scopes: submission.scopes(), cause }
		})?;

		info!("Committed overrides for {} scope(s)", ticket.units.len());
		Ok(())
	}

	/// Changed paths of a ticket that need a restart once committed
	pub fn restart_required(&self, ticket: &CommitTicket) -> BTreeSet<Path> {
		ticket
			.units
			.iter()
			.flat_map(|unit| unit.changed_paths.iter())
			.filter(|path| self.registry.requires_restart(&path.to_string()))
			.cloned()
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory_adapter::MemoryLayerAdapter;
	use crate::settings::{DataType, SettingDefinition, SettingsRegistry, ValidatorId};
	use serde_json::json;

	fn registry() -> Arc<FrozenSettingsRegistry> {
		let mut registry = SettingsRegistry::new();
		registry
			.register(
				SettingDefinition::builder("port")
					.data_type(DataType::Int)
					.validate(ValidatorId::Port)
					.requires_restart(true)
					.build()
					.unwrap(),
			)
			.unwrap();
		Arc::new(registry.freeze())
	}

	fn unit(scope: Scope, tree: serde_json::Value, changed: &[&str]) -> CommitUnit {
		CommitUnit {
			scope,
			tree: ConfigTree::from_json(tree).unwrap(),
			changed_paths: changed.iter().map(|p| Path::parse(p)).collect(),
			entries: BTreeMap::new(),
		}
	}

	#[test]
	fn test_submission_shape() {
		let ticket = CommitTicket {
			generation: 1,
			lock: None,
			units: vec![
				unit(Scope::Node("n1".into()), json!({"x": 1}), &["x"]),
				unit(Scope::Node("n2".into()), json!({"y": 2}), &["y"]),
			],
		};
		match ticket.submission() {
			OverrideSubmission::Nodes(nodes) => {
				assert_eq!(nodes.len(), 2);
				assert_eq!(nodes[&NodeId::from("n1")].to_json(), json!({"x": 1}));
			}
			other => panic!("unexpected submission {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_validation_blocks_submission() {
		let adapter = Arc::new(MemoryLayerAdapter::new());
		let coordinator = CommitCoordinator::new(registry(), adapter.clone());
		let ticket = CommitTicket {
			generation: 1,
			units: vec![unit(Scope::Network, json!({"port": "abc", "free": "x"}), &["port", "free"])],
			lock: None,
		};

		match coordinator.submit(&ticket).await {
			Err(CommitError::Validation(errors)) => {
				assert_eq!(errors.len(), 1);
				assert_eq!(errors[0].path, Path::parse("port"));
				assert_eq!(errors[0].scope, Some(Scope::Network));
			}
			other => panic!("unexpected result {:?}", other),
		}
		assert!(adapter.submissions().is_empty());
	}

	#[tokio::test]
	async fn test_removed_path_is_valid() {
		let adapter = Arc::new(MemoryLayerAdapter::new());
		let coordinator = CommitCoordinator::new(registry(), adapter.clone());
		let ticket = CommitTicket {
			generation: 1,
			units: vec![unit(Scope::Network, json!({}), &["port"])],
			lock: None,
		};
		coordinator.submit(&ticket).await.unwrap();
		assert_eq!(adapter.submissions().len(), 1);
		assert_eq!(coordinator.restart_required(&ticket), BTreeSet::from([Path::parse("port")]));
	}

	#[test]
	fn test_lock_released_on_drop() {
		let in_flight = InFlightScopes::default();
		let n1 = Scope::Node("n1".into());
		let n2 = Scope::Node("n2".into());
		let first = InFlightLock::acquire(&in_flight, vec![n1]);
		let second = InFlightLock::acquire(&in_flight, vec![n2.clone()]);
		assert_eq!(in_flight.lock().len(), 2);

		drop(first);
		assert_eq!(*in_flight.lock(), BTreeSet::from([n2]));
		drop(second);
		assert!(in_flight.lock().is_empty());
	}

	#[tokio::test]
	async fn test_persistence_failure() {
		let adapter = Arc::new(MemoryLayerAdapter::new());
		adapter.fail_submits(true);
		let coordinator = CommitCoordinator::new(registry(), adapter.clone());
		let ticket = CommitTicket {
			generation: 1,
			units: vec![unit(Scope::Network, json!({"port": 80}), &["port"])],
			lock: None,
		};

		match coordinator.submit(&ticket).await {
			Err(CommitError::Persistence(err)) => assert_eq!(err.scopes, vec![Scope::Network]),
			other => panic!("unexpected result {:?}", other),
		}
	}
}

// vim: ts=4
