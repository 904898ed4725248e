//! Structural diff of configuration trees

use std::collections::BTreeSet;

use crate::prelude::*;

/// Leaf paths that differ between two trees.
///
/// The union of keys is visited at every level. A key present on one side only
/// reports all leaves below it (or the key itself for an empty branch). A leaf
/// replaced by a branch, or the other way round, reports the leaf and every
/// leaf of the branch.
pub fn changed_paths(original: &ConfigTree, changed: &ConfigTree) -> BTreeSet<Path> {
	let mut out = BTreeSet::new();
	walk(original, changed, &Path::root(), &mut out);
	out
}

fn walk(original: &ConfigTree, changed: &ConfigTree, prefix: &Path, out: &mut BTreeSet<Path>) {
	let keys: BTreeSet<&str> = original.keys().chain(changed.keys()).collect();
	for key in keys {
		let path = prefix.child(key);
		match (original.entry(key), changed.entry(key)) {
			(Some(ConfigNode::Leaf(a)), Some(ConfigNode::Leaf(b))) => {
				if a != b {
					out.insert(path);
				}
			}
			(Some(ConfigNode::Branch(a)), Some(ConfigNode::Branch(b))) => walk(a, b, &path, out),
			(Some(ConfigNode::Leaf(_)), Some(ConfigNode::Branch(tree)))
			| (Some(ConfigNode::Branch(tree)), Some(ConfigNode::Leaf(_))) => {
				out.insert(path.clone());
				collect_leaves(tree, &path, out);
			}
			(Some(node), None) | (None, Some(node)) => match node {
				ConfigNode::Leaf(_) => {
					out.insert(path);
				}
				ConfigNode::Branch(tree) => {
					if tree.is_empty() {
						out.insert(path);
					} else {
						collect_leaves(tree, &path, out);
					}
				}
			},
			(None, None) => {}
		}
	}
}

fn collect_leaves(tree: &ConfigTree, prefix: &Path, out: &mut BTreeSet<Path>) {
	for (path, _) in tree.leaves() {
		out.insert(Path::from_segments(prefix.segments().iter().chain(path.segments()).cloned()));
	}
}


// vim: ts=4
