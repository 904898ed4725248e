//! Uncommitted edits of one scope unit
//!
//! The draft is a sparse map of path to either a new value or a revert marker.
//! `config_with_changes` is the editable layer as it will look once the draft
//! is committed; it is always recomputed from the snapshot and the draft so it
//! can never drift from them.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::diff;
use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum DraftValue {
	Set(Scalar),
	/// Drop the override at the editable layer. Never persisted.
	Revert,
}

impl DraftValue {
	pub fn is_revert(&self) -> bool {
		matches!(self, DraftValue::Revert)
	}
}

#[derive(Debug, Clone, Default)]
pub struct DraftManager {
	snapshot: ConfigTree,
	draft: BTreeMap<Path, DraftValue>,
	config_with_changes: ConfigTree,
}

impl DraftManager {
	/// Start an empty draft over the committed editable layer
	pub fn new(snapshot: ConfigTree) -> Self {
		Self { config_with_changes: snapshot.clone(), snapshot, draft: BTreeMap::new() }
	}

	/// Apply a draft to a tree
	pub fn project(snapshot: &ConfigTree, draft: &BTreeMap<Path, DraftValue>) -> ConfigTree {
		let mut tree = snapshot.clone();
		for (path, value) in draft {
			match value {
				DraftValue::Set(value) => tree.set(path, value.clone()),
				DraftValue::Revert => {
					tree.remove_pruned(path);
				}
			}
		}
		tree
	}

	fn reproject(&mut self) {
		self.config_with_changes = Self::project(&self.snapshot, &self.draft);
	}

	/// Entries are kept disjoint: a new entry replaces every entry above or
	/// below its path.
	fn clear_overlapping(&mut self, path: &Path) {
		self.draft.retain(|entry, _| !entry.overlaps(path));
	}

	pub fn edit(&mut self, path: &Path, value: Scalar) {
		if path.is_root() {
			return;
		}
		self.clear_overlapping(path);
		self.draft.insert(path.clone(), DraftValue::Set(value));
		self.reproject();
	}

	/// Mark the override at `path` for removal. A branch expands into one
	/// marker per override leaf below it. The root path is ignored.
	pub fn revert(&mut self, path: &Path) {
		if path.is_root() {
			return;
		}
		self.clear_overlapping(path);
		match self.snapshot.get_tree(path) {
			Some(tree) if !tree.is_empty() => {
				for (leaf, _) in tree.leaves() {
					let full = Path::from_segments(path.segments().iter().chain(leaf.segments()).cloned());
					self.draft.insert(full, DraftValue::Revert);
				}
			}
			_ => {
				self.draft.insert(path.clone(), DraftValue::Revert);
			}
		}
		self.reproject();
	}

	fn undo_matching(&mut self, path: &Path, revert: bool) {
		let before = self.draft.len();
		self.draft.retain(|entry, value| !(entry.starts_with(path) && value.is_revert() == revert));
		if self.draft.len() != before {
			self.reproject();
		}
	}

	/// Drop the edit at (or below) `path`, restoring the committed value
	pub fn undo_edit(&mut self, path: &Path) {
		self.undo_matching(path, false);
	}

	/// Drop the revert marker at (or below) `path`, restoring the override
	pub fn undo_revert(&mut self, path: &Path) {
		self.undo_matching(path, true);
	}

	pub fn reset(&mut self) {
		self.draft.clear();
		self.config_with_changes = self.snapshot.clone();
	}

	/// Draft entry affecting `path`: its own entry, or a revert of an ancestor
	pub fn get(&self, path: &Path) -> Option<&DraftValue> {
		if let Some(value) = self.draft.get(path) {
			return Some(value);
		}
		let mut current = path.parent();
		while let Some(ancestor) = current {
			if let Some(value @ DraftValue::Revert) = self.draft.get(&ancestor) {
				return Some(value);
			}
			current = ancestor.parent();
		}
		None
	}

	pub fn entries(&self) -> &BTreeMap<Path, DraftValue> {
		&self.draft
	}

	pub fn is_empty(&self) -> bool {
		self.draft.is_empty()
	}

	pub fn len(&self) -> usize {
		self.draft.len()
	}

	pub fn snapshot(&self) -> &ConfigTree {
		&self.snapshot
	}

	pub fn config_with_changes(&self) -> &ConfigTree {
		&self.config_with_changes
	}

	pub fn changed_paths(&self) -> BTreeSet<Path> {
		diff::changed_paths(&self.snapshot, &self.config_with_changes)
	}

	/// Take a committed tree as the new snapshot. Only the committed entries
	/// leave the draft; entries edited again meanwhile are kept.
	pub fn commit(&mut self, tree: ConfigTree, committed: &BTreeMap<Path, DraftValue>) {
		for (path, value) in committed {
			if self.draft.get(path) == Some(value) {
				self.draft.remove(path);
			}
		}
		self.snapshot = tree;
		self.reproject();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn tree(value: serde_json::Value) -> ConfigTree {
		ConfigTree::from_json(value).unwrap()
	}

	fn manager(value: serde_json::Value) -> DraftManager {
		DraftManager::new(tree(value))
	}

	#[test]
	fn test_edit_and_undo_edit() {
		let mut draft = manager(json!({"a": 2}));
		draft.edit(&"a".into(), Scalar::Int(7));
		draft.edit(&"b.c".into(), Scalar::from("x"));
		assert_eq!(draft.config_with_changes().to_json(), json!({"a": 7, "b": {"c": "x"}}));
		assert_eq!(draft.get(&"a".into()), Some(&DraftValue::Set(Scalar::Int(7))));

		draft.undo_edit(&"a".into());
		draft.undo_edit(&"b.c".into());
		assert!(draft.is_empty());
		assert_eq!(draft.config_with_changes(), draft.snapshot());
	}

	#[test]
	fn test_revert_and_undo_revert() {
		let mut draft = manager(json!({"a": 2, "b": {"c": 1}}));
		draft.revert(&"b.c".into());
		assert_eq!(draft.config_with_changes().to_json(), json!({"a": 2}));
		assert_eq!(draft.get(&"b.c".into()), Some(&DraftValue::Revert));

		draft.undo_revert(&"b.c".into());
		assert!(draft.is_empty());
		assert_eq!(draft.config_with_changes().to_json(), json!({"a": 2, "b": {"c": 1}}));
	}

	#[test]
	fn test_revert_of_branch_expands_to_leaves() {
		let mut draft = manager(json!({"b": {"c": 1, "d": {"e": 2}}, "a": 1}));
		draft.revert(&"b".into());
		assert_eq!(draft.len(), 2);
		assert_eq!(draft.config_with_changes().to_json(), json!({"a": 1}));
		assert_eq!(draft.get(&"b.d.e".into()), Some(&DraftValue::Revert));

		draft.undo_revert(&"b".into());
		assert!(draft.is_empty());
	}

	#[test]
	fn test_revert_of_missing_override_is_noop() {
		let mut draft = manager(json!({"a": 1}));
		draft.revert(&"zzz".into());
		assert_eq!(draft.len(), 1);
		assert_eq!(draft.config_with_changes(), draft.snapshot());
		assert!(draft.changed_paths().is_empty());
	}

	#[test]
	fn test_revert_of_root_is_ignored() {
		let mut draft = manager(json!({}));
		draft.edit(&"a".into(), Scalar::Int(1));
		draft.revert(&Path::root());
		assert_eq!(draft.len(), 1);
		assert_eq!(draft.config_with_changes().to_json(), json!({"a": 1}));

		let mut draft = manager(json!({"b": 2}));
		draft.edit(&"a".into(), Scalar::Int(1));
		draft.revert(&Path::root());
		assert_eq!(draft.entries().keys().map(ToString::to_string).collect::<Vec<_>>(), vec!["a"]);
		assert_eq!(draft.config_with_changes().to_json(), json!({"a": 1, "b": 2}));
	}

	#[test]
	fn test_entries_stay_disjoint() {
		let mut draft = manager(json!({}));
		draft.edit(&"a.b".into(), Scalar::Int(1));
		draft.edit(&"a.c".into(), Scalar::Int(2));
		draft.edit(&"a".into(), Scalar::Int(3));
		assert_eq!(draft.len(), 1);
		assert_eq!(draft.config_with_changes().to_json(), json!({"a": 3}));

		// undo of a kind that is not present changes nothing
		draft.undo_revert(&"a".into());
		assert_eq!(draft.len(), 1);
	}

	#[test]
	fn test_projection_is_reproducible() {
		let mut draft = manager(json!({"a": 1, "b": {"c": 1, "d": 2}}));
		draft.edit(&"x.y".into(), Scalar::Bool(true));
		draft.revert(&"b.c".into());
		draft.edit(&"a".into(), Scalar::Int(9));
		draft.undo_edit(&"x.y".into());
		let projected = DraftManager::project(draft.snapshot(), draft.entries());
		assert_eq!(&projected, draft.config_with_changes());
		assert_eq!(projected.to_json(), json!({"a": 9, "b": {"d": 2}}));
	}

	#[test]
	fn test_reset() {
		let mut draft = manager(json!({"a": 1}));
		draft.edit(&"a".into(), Scalar::Int(2));
		draft.revert(&"b".into());
		draft.reset();
		assert!(draft.is_empty());
		assert_eq!(draft.config_with_changes(), draft.snapshot());
	}

	#[test]
	fn test_changed_paths() {
		let mut draft = manager(json!({"a": 1, "b": 2}));
		draft.edit(&"a".into(), Scalar::Int(1));
		draft.edit(&"c".into(), Scalar::Int(3));
		draft.revert(&"b".into());
		let changed: Vec<String> = draft.changed_paths().iter().map(|p| p.to_string()).collect();
		// editing to the committed value is not a change
		assert_eq!(changed, vec!["b", "c"]);
	}

	#[test]
	fn test_commit_keeps_newer_entries() {
		let mut draft = manager(json!({"a": 1}));
		draft.edit(&"a".into(), Scalar::Int(2));
		draft.edit(&"b".into(), Scalar::Int(3));
		let committed = draft.entries().clone();
		let committed_tree = draft.config_with_changes().clone();

		// edited again while the commit was in flight
		draft.edit(&"b".into(), Scalar::Int(4));
		draft.commit(committed_tree, &committed);

		assert_eq!(draft.snapshot().to_json(), json!({"a": 2, "b": 3}));
		assert_eq!(draft.len(), 1);
		assert_eq!(draft.get(&"b".into()), Some(&DraftValue::Set(Scalar::Int(4))));
		assert_eq!(draft.config_with_changes().to_json(), json!({"a": 2, "b": 4}));
	}
}

// vim: ts=4
