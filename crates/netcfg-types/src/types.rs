//! Common types used throughout the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tree::ConfigTree;

// NodeId //
//********//
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Box<str>);

impl NodeId {
	pub fn new(name: impl Into<Box<str>>) -> Self {
		Self(name.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(name: &str) -> Self {
		Self(name.into())
	}
}

// Scope //
//*******//
/// The unit being edited: the whole network or one managed node
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
	Network,
	Node(NodeId),
}

impl Scope {
	/// The layer user edits are written to in this scope
	pub fn editable_layer(&self) -> LayerId {
		match self {
			Scope::Network => LayerId::Network,
			Scope::Node(_) => LayerId::Node,
		}
	}

	/// Whether a layer may appear in this scope at all
	pub fn admits(&self, id: LayerId) -> bool {
		match self {
			Scope::Network => !matches!(id, LayerId::AutoNode | LayerId::Node),
			Scope::Node(_) => true,
		}
	}

	pub fn node_id(&self) -> Option<&NodeId> {
		match self {
			Scope::Network => None,
			Scope::Node(id) => Some(id),
		}
	}
}

impl fmt::Display for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Scope::Network => write!(f, "network"),
			Scope::Node(id) => write!(f, "node:{}", id),
		}
	}
}

// LayerId //
//*********//
/// Configuration layers in ascending precedence order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LayerId {
	Base,
	HardwareBase,
	FirmwareBase,
	/// Auto-generated node overrides, read-only, node scope only
	AutoNode,
	Network,
	Node,
}

impl LayerId {
	pub const ALL: [LayerId; 6] = [
		LayerId::Base,
		LayerId::HardwareBase,
		LayerId::FirmwareBase,
		LayerId::AutoNode,
		LayerId::Network,
		LayerId::Node,
	];

	/// Fixed precedence rank, higher wins
	pub fn rank(self) -> u8 {
		match self {
			LayerId::Base => 0,
			LayerId::HardwareBase => 1,
			LayerId::FirmwareBase => 2,
			LayerId::AutoNode => 3,
			LayerId::Network => 4,
			LayerId::Node => 5,
		}
	}

	/// Only the override layers can ever be written by a user
	pub fn is_user_editable(self) -> bool {
		matches!(self, LayerId::Network | LayerId::Node)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			LayerId::Base => "BASE",
			LayerId::HardwareBase => "HARDWARE_BASE",
			LayerId::FirmwareBase => "FIRMWARE_BASE",
			LayerId::AutoNode => "AUTO_NODE",
			LayerId::Network => "NETWORK",
			LayerId::Node => "NODE",
		}
	}
}

impl fmt::Display for LayerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

// Layer //
//*******//
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
	pub id: LayerId,
	pub tree: ConfigTree,
	pub mutable: bool,
}

impl Layer {
	/// A layer whose mutability follows from its id
	pub fn new(id: LayerId, tree: ConfigTree) -> Self {
		Self { id, tree, mutable: id.is_user_editable() }
	}

	pub fn empty(id: LayerId) -> Self {
		Self::new(id, ConfigTree::new())
	}

	pub fn precedence_rank(&self) -> u8 {
		self.id.rank()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_precedence_is_total() {
		let ranks: Vec<u8> = LayerId::ALL.iter().map(|id| id.rank()).collect();
		assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5]);
		let mut sorted = LayerId::ALL;
		sorted.sort();
		assert_eq!(sorted, LayerId::ALL);
	}

	#[test]
	fn test_scope_editable_layer() {
		assert_eq!(Scope::Network.editable_layer(), LayerId::Network);
		assert_eq!(Scope::Node("n1".into()).editable_layer(), LayerId::Node);
		assert!(!Scope::Network.admits(LayerId::AutoNode));
		assert!(Scope::Node("n1".into()).admits(LayerId::AutoNode));
	}

	#[test]
	fn test_layer_mutability() {
		assert!(Layer::empty(LayerId::Network).mutable);
		assert!(!Layer::empty(LayerId::AutoNode).mutable);
		assert!(!Layer::empty(LayerId::Base).mutable);
	}
}

// vim: ts=4
