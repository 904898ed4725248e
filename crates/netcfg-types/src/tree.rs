//! Configuration trees
//!
//! A configuration layer (and the working copy of an editable layer) is a
//! recursive map from key to either a scalar or another map. Paths address a
//! location in the tree as an ordered list of segments (a dotted key).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::prelude::*;

// Scalar //
//********//
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
	Bool(bool), // Must be before Int to avoid bool -> int coercion
	Int(i64),
	Float(f64),
	String(Box<str>),
}

impl Scalar {
	/// Get the type name for error messages
	pub fn type_name(&self) -> &'static str {
		match self {
			Scalar::Bool(_) => "bool",
			Scalar::Int(_) => "int",
			Scalar::Float(_) => "float",
			Scalar::String(_) => "string",
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Scalar::String(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Scalar::Bool(b) => Some(*b),
			_ => None,
		}
	}

	pub fn as_int(&self) -> Option<i64> {
		match self {
			Scalar::Int(i) => Some(*i),
			_ => None,
		}
	}
}

/// Raw textual form, as typed into an input field
impl fmt::Display for Scalar {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Scalar::Bool(b) => write!(f, "{}", b),
			Scalar::Int(i) => write!(f, "{}", i),
			Scalar::Float(x) => write!(f, "{}", x),
			Scalar::String(s) => f.write_str(s),
		}
	}
}

impl From<bool> for Scalar {
	fn from(value: bool) -> Self {
		Scalar::Bool(value)
	}
}

impl From<i64> for Scalar {
	fn from(value: i64) -> Self {
		Scalar::Int(value)
	}
}

impl From<f64> for Scalar {
	fn from(value: f64) -> Self {
		Scalar::Float(value)
	}
}

impl From<&str> for Scalar {
	fn from(value: &str) -> Self {
		Scalar::String(value.into())
	}
}

impl From<String> for Scalar {
	fn from(value: String) -> Self {
		Scalar::String(value.into_boxed_str())
	}
}

// Path //
//******//
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<Box<str>>);

impl Path {
	/// The empty path, addressing the tree itself
	pub fn root() -> Self {
		Self(Vec::new())
	}

	/// Parse a dotted key. Empty segments are ignored.
	pub fn parse(dotted: &str) -> Self {
		Self(dotted.split('.').filter(|s| !s.is_empty()).map(Box::from).collect())
	}

	pub fn from_segments<I, S>(segments: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<Box<str>>,
	{
		Self(segments.into_iter().map(Into::into).collect())
	}

	pub fn segments(&self) -> &[Box<str>] {
		&self.0
	}

	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn child(&self, segment: &str) -> Self {
		let mut segments = self.0.clone();
		segments.push(segment.into());
		Self(segments)
	}

	pub fn parent(&self) -> Option<Self> {
		self.0.split_last().map(|(_, rest)| Self(rest.to_vec()))
	}

	/// True if `prefix` is this path or one of its ancestors
	pub fn starts_with(&self, prefix: &Path) -> bool {
		self.0.starts_with(&prefix.0)
	}

	/// True if the two paths address overlapping subtrees
	pub fn overlaps(&self, other: &Path) -> bool {
		self.starts_with(other) || other.starts_with(self)
	}
}

impl fmt::Display for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.join("."))
	}
}

impl From<&str> for Path {
	fn from(dotted: &str) -> Self {
		Path::parse(dotted)
	}
}

impl Serialize for Path {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for Path {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		Ok(Path::parse(&String::deserialize(deserializer)?))
	}
}

// ConfigNode, ConfigTree //
//************************//
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigNode {
	Leaf(Scalar),
	Branch(ConfigTree),
}

impl ConfigNode {
	pub fn as_scalar(&self) -> Option<&Scalar> {
		match self {
			ConfigNode::Leaf(value) => Some(value),
			ConfigNode::Branch(_) => None,
		}
	}

	pub fn as_tree(&self) -> Option<&ConfigTree> {
		match self {
			ConfigNode::Leaf(_) => None,
			ConfigNode::Branch(tree) => Some(tree),
		}
	}
}

impl From<Scalar> for ConfigNode {
	fn from(value: Scalar) -> Self {
		ConfigNode::Leaf(value)
	}
}

impl From<ConfigTree> for ConfigNode {
	fn from(tree: ConfigTree) -> Self {
		ConfigNode::Branch(tree)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigTree {
	entries: BTreeMap<Box<str>, ConfigNode>,
}

impl ConfigTree {
	pub fn new() -> Self {
		Self::default()
	}

	/// Parse a JSON object into a tree. Anything that is not map/scalar shaped
	/// (arrays, nulls, a non-object root) is rejected as a corrupt layer.
	pub fn from_json(value: serde_json::Value) -> NcResult<Self> {
		if !value.is_object() {
			return Err(Error::CorruptLayer(format!(
				"expected an object at the layer root, got {}",
				value
			)));
		}
		serde_json::from_value(value).map_err(|err| Error::CorruptLayer(err.to_string()))
	}

	pub fn to_json(&self) -> serde_json::Value {
		serde_json::to_value(self).unwrap_or_default()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
		self.entries.iter().map(|(k, v)| (k.as_ref(), v))
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(AsRef::as_ref)
	}

	/// Direct child lookup
	pub fn entry(&self, key: &str) -> Option<&ConfigNode> {
		self.entries.get(key)
	}

	/// Node at `path`. The root path has no node.
	pub fn get(&self, path: &Path) -> Option<&ConfigNode> {
		let (last, parents) = path.segments().split_last()?;
		let mut current = self;
		for segment in parents {
			current = current.entries.get(segment)?.as_tree()?;
		}
		current.entries.get(last)
	}

	/// Scalar at `path`; `None` when absent or when the path is a branch
	pub fn get_scalar(&self, path: &Path) -> Option<&Scalar> {
		self.get(path).and_then(ConfigNode::as_scalar)
	}

	/// Subtree at `path`; the root path yields the tree itself
	pub fn get_tree(&self, path: &Path) -> Option<&ConfigTree> {
		if path.is_root() {
			return Some(self);
		}
		self.get(path).and_then(ConfigNode::as_tree)
	}

	pub fn contains(&self, path: &Path) -> bool {
		self.get(path).is_some()
	}

	/// Set a node, creating intermediate branches. An intermediate leaf is
	/// replaced by a branch. Setting the root path is a no-op.
	pub fn set(&mut self, path: &Path, node: impl Into<ConfigNode>) {
		let Some((last, parents)) = path.segments().split_last() else {
			return;
		};
		let mut current = self;
		for segment in parents {
			let slot = current
				.entries
				.entry(segment.clone())
				.or_insert_with(|| ConfigNode::Branch(ConfigTree::new()));
			if let ConfigNode::Leaf(_) = slot {
				*slot = ConfigNode::Branch(ConfigTree::new());
			}
			current = match slot {
				ConfigNode::Branch(tree) => tree,
				ConfigNode::Leaf(_) => return,
			};
		}
		current.entries.insert(last.clone(), node.into());
	}

	/// Remove the node at `path` without touching its ancestors
	pub fn remove(&mut self, path: &Path) -> Option<ConfigNode> {
		let (last, parents) = path.segments().split_last()?;
		let mut current = self;
		for segment in parents {
			current = match current.entries.get_mut(segment)? {
				ConfigNode::Branch(tree) => tree,
				ConfigNode::Leaf(_) => return None,
			};
		}
		current.entries.remove(last)
	}

	/// Remove the node at `path` and prune every ancestor branch left empty
	pub fn remove_pruned(&mut self, path: &Path) -> Option<ConfigNode> {
		fn walk(tree: &mut ConfigTree, segments: &[Box<str>]) -> Option<ConfigNode> {
			let (first, rest) = segments.split_first()?;
			if rest.is_empty() {
				return tree.entries.remove(first);
			}
			let (removed, now_empty) = match tree.entries.get_mut(first)? {
				ConfigNode::Branch(child) => {
					let removed = walk(child, rest)?;
					(removed, child.is_empty())
				}
				ConfigNode::Leaf(_) => return None,
			};
			if now_empty {
				tree.entries.remove(first);
			}
			Some(removed)
		}
		walk(self, path.segments())
	}

	/// Deep merge `overlay` into this tree. Maps merge by key, anything else is
	/// replaced by the overlay.
	pub fn merge(&mut self, overlay: &ConfigTree) {
		for (key, overlay_node) in &overlay.entries {
			match (self.entries.get_mut(key), overlay_node) {
				(Some(ConfigNode::Branch(base)), ConfigNode::Branch(over)) => base.merge(over),
				_ => {
					self.entries.insert(key.clone(), overlay_node.clone());
				}
			}
		}
	}

	/// All leaves with their full paths, in key order
	pub fn leaves(&self) -> Vec<(Path, &Scalar)> {
		fn walk<'a>(tree: &'a ConfigTree, prefix: &Path, out: &mut Vec<(Path, &'a Scalar)>) {
			for (key, node) in &tree.entries {
				let path = prefix.child(key);
				match node {
					ConfigNode::Leaf(value) => out.push((path, value)),
					ConfigNode::Branch(child) => walk(child, &path, out),
				}
			}
		}
		let mut out = Vec::new();
		walk(self, &Path::root(), &mut out);
		out
	}
}

impl FromIterator<(Path, Scalar)> for ConfigTree {
	fn from_iter<I: IntoIterator<Item = (Path, Scalar)>>(iter: I) -> Self {
		let mut tree = ConfigTree::new();
		for (path, value) in iter {
			tree.set(&path, value);
		}
		tree
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn tree(value: serde_json::Value) -> ConfigTree {
		ConfigTree::from_json(value).unwrap()
	}

	#[test]
	fn test_path_parse_and_display() {
		let path = Path::parse("radio.txPower");
		assert_eq!(path.segments().len(), 2);
		assert_eq!(path.to_string(), "radio.txPower");
		assert_eq!(Path::parse("a..b."), Path::from_segments(["a", "b"]));
		assert!(Path::parse("").is_root());
	}

	#[test]
	fn test_path_relations() {
		let parent = Path::parse("a.b");
		let child = Path::parse("a.b.c");
		assert!(child.starts_with(&parent));
		assert!(!parent.starts_with(&child));
		assert!(parent.overlaps(&child));
		assert!(!Path::parse("a.bc").overlaps(&parent));
		assert_eq!(child.parent(), Some(parent));
		assert_eq!(Path::root().parent(), None);
	}

	#[test]
	fn test_from_json_scalars() {
		let t = tree(json!({"a": 1, "b": {"c": "x", "d": true, "e": 1.5}}));
		assert_eq!(t.get_scalar(&"a".into()), Some(&Scalar::Int(1)));
		assert_eq!(t.get_scalar(&"b.c".into()), Some(&Scalar::from("x")));
		assert_eq!(t.get_scalar(&"b.d".into()), Some(&Scalar::Bool(true)));
		assert_eq!(t.get_scalar(&"b.e".into()), Some(&Scalar::Float(1.5)));
		// a branch is not a scalar
		assert_eq!(t.get_scalar(&"b".into()), None);
		assert!(t.get_tree(&"b".into()).is_some());
	}

	#[test]
	fn test_from_json_rejects_arrays_and_nulls() {
		assert!(matches!(
			ConfigTree::from_json(json!({"a": [1, 2]})),
			Err(Error::CorruptLayer(_))
		));
		assert!(matches!(ConfigTree::from_json(json!({"a": null})), Err(Error::CorruptLayer(_))));
		assert!(matches!(ConfigTree::from_json(json!("flat")), Err(Error::CorruptLayer(_))));
	}

	#[test]
	fn test_unknown_paths_are_unset() {
		let t = tree(json!({"a": 1}));
		assert_eq!(t.get(&"a.b.c".into()), None);
		assert_eq!(t.get(&"zzz".into()), None);
		assert_eq!(t.get(&Path::root()), None);
	}

	#[test]
	fn test_set_creates_branches() {
		let mut t = ConfigTree::new();
		t.set(&"a.b.c".into(), Scalar::Int(3));
		assert_eq!(t.to_json(), json!({"a": {"b": {"c": 3}}}));

		// an intermediate leaf turns into a branch
		let mut t = tree(json!({"a": 1}));
		t.set(&"a.b".into(), Scalar::Int(2));
		assert_eq!(t.to_json(), json!({"a": {"b": 2}}));
	}

	#[test]
	fn test_remove_pruned() {
		let mut t = tree(json!({"a": {"b": {"c": 1}}, "d": 2}));
		let removed = t.remove_pruned(&"a.b.c".into());
		assert_eq!(removed, Some(ConfigNode::Leaf(Scalar::Int(1))));
		assert_eq!(t.to_json(), json!({"d": 2}));

		let mut t = tree(json!({"a": {"b": 1, "c": 2}}));
		t.remove_pruned(&"a.b".into());
		assert_eq!(t.to_json(), json!({"a": {"c": 2}}));

		// missing paths leave the tree alone
		let mut t = tree(json!({"a": {"b": 1}}));
		assert_eq!(t.remove_pruned(&"a.x.y".into()), None);
		assert_eq!(t.to_json(), json!({"a": {"b": 1}}));
	}

	#[test]
	fn test_remove_keeps_empty_parents() {
		let mut t = tree(json!({"a": {"b": 1}}));
		t.remove(&"a.b".into());
		assert_eq!(t.to_json(), json!({"a": {}}));
	}

	#[test]
	fn test_merge() {
		let mut base = tree(json!({"radio": {"power": 10, "channel": 2}, "name": "x"}));
		let overlay = tree(json!({"radio": {"power": 20}, "extra": true}));
		base.merge(&overlay);
		assert_eq!(
			base.to_json(),
			json!({"radio": {"power": 20, "channel": 2}, "name": "x", "extra": true})
		);
	}

	#[test]
	fn test_leaves() {
		let t = tree(json!({"b": {"y": 2, "x": 1}, "a": "s"}));
		let paths: Vec<String> = t.leaves().into_iter().map(|(p, _)| p.to_string()).collect();
		assert_eq!(paths, vec!["a", "b.x", "b.y"]);
	}
}

// vim: ts=4
