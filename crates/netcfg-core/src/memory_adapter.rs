//! In-memory layer store
//!
//! Holds every layer in process memory. Used as the test double for the
//! editor and the coordinator, and for tools that seed layers from files.
//! Loads and submits can be made to fail on demand.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;

use netcfg_types::layer_adapter::{LayerAdapter, OverrideSubmission};

use crate::prelude::*;

#[derive(Debug, Default)]
struct State {
	/// Layers shared by every scope (bases and the network overrides)
	shared: BTreeMap<LayerId, ConfigTree>,
	auto_node: BTreeMap<NodeId, ConfigTree>,
	node: BTreeMap<NodeId, ConfigTree>,
	fail_loads: bool,
	fail_submits: bool,
	stall_submits: bool,
	submissions: Vec<OverrideSubmission>,
}

#[derive(Debug, Default)]
pub struct MemoryLayerAdapter {
	state: RwLock<State>,
}

impl MemoryLayerAdapter {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a layer visible in every scope
	pub fn with_layer(self, id: LayerId, tree: ConfigTree) -> Self {
		self.state.write().shared.insert(id, tree);
		self
	}

	/// Add a per-node layer (AUTO_NODE or NODE)
	pub fn with_node_layer(self, node: impl Into<NodeId>, id: LayerId, tree: ConfigTree) -> Self {
		let node = node.into();
		{
			let mut state = self.state.write();
			match id {
				LayerId::AutoNode => {
					state.auto_node.insert(node, tree);
				}
				LayerId::Node => {
					state.node.insert(node, tree);
				}
				other => {
					state.shared.insert(other, tree);
				}
			}
		}
		self
	}

	pub fn fail_loads(&self, fail: bool) {
		self.state.write().fail_loads = fail;
	}

	pub fn fail_submits(&self, fail: bool) {
		self.state.write().fail_submits = fail;
	}

	/// Submits never complete while set
	pub fn stall_submits(&self, stall: bool) {
		self.state.write().stall_submits = stall;
	}

	/// Every accepted submission, oldest first
	pub fn submissions(&self) -> Vec<OverrideSubmission> {
		self.state.read().submissions.clone()
	}

	pub fn network_overrides(&self) -> Option<ConfigTree> {
		self.state.read().shared.get(&LayerId::Network).cloned()
	}

	pub fn node_overrides(&self, node: &NodeId) -> Option<ConfigTree> {
		self.state.read().node.get(node).cloned()
	}
}

#[async_trait]
impl LayerAdapter for MemoryLayerAdapter {
	async fn load_layers(&self, scope: &Scope) -> NcResult<Vec<Layer>> {
		let state = self.state.read();
		if state.fail_loads {
			return Err(Error::DbError);
		}

		let mut layers: Vec<Layer> =
			state.shared.iter().map(|(id, tree)| Layer::new(*id, tree.clone())).collect();
		if let Scope::Node(node) = scope {
			if let Some(tree) = state.auto_node.get(node) {
				layers.push(Layer::new(LayerId::AutoNode, tree.clone()));
			}
			if let Some(tree) = state.node.get(node) {
				layers.push(Layer::new(LayerId::Node, tree.clone()));
			}
		}
		Ok(layers)
	}

	async fn submit_overrides(&self, submission: &OverrideSubmission) -> NcResult<()> {
		let stalled = self.state.read().stall_submits;
		if stalled {
			std::future::pending::<()>().await;
		}

		let mut state = self.state.write();
		if state.fail_submits {
			return Err(Error::DbError);
		}

		match submission {
			OverrideSubmission::Network(tree) => {
				state.shared.insert(LayerId::Network, tree.clone());
			}
			OverrideSubmission::Nodes(nodes) => {
				for (node, tree) in nodes {
					state.node.insert(node.clone(), tree.clone());
				}
			}
		}
		state.submissions.push(submission.clone());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn tree(value: serde_json::Value) -> ConfigTree {
		ConfigTree::from_json(value).unwrap()
	}

	#[tokio::test]
	async fn test_load_by_scope() {
		let adapter = MemoryLayerAdapter::new()
			.with_layer(LayerId::Base, tree(json!({"a": 1})))
			.with_layer(LayerId::Network, tree(json!({"a": 2})))
			.with_node_layer("n1", LayerId::AutoNode, tree(json!({"b": 1})))
			.with_node_layer("n1", LayerId::Node, tree(json!({"c": 1})));

		let network = adapter.load_layers(&Scope::Network).await.unwrap();
		assert_eq!(network.len(), 2);
		let node = adapter.load_layers(&Scope::Node("n1".into())).await.unwrap();
		assert_eq!(node.len(), 4);
		let other = adapter.load_layers(&Scope::Node("n2".into())).await.unwrap();
		assert_eq!(other.len(), 2);
	}

	#[tokio::test]
	async fn test_node_submission_is_partial() {
		let adapter = MemoryLayerAdapter::new()
			.with_node_layer("n1", LayerId::Node, tree(json!({"x": 1})))
			.with_node_layer("n2", LayerId::Node, tree(json!({"y": 1})));
		let submission =
			OverrideSubmission::Nodes(BTreeMap::from([(NodeId::from("n1"), tree(json!({"x": 2})))]));
		adapter.submit_overrides(&submission).await.unwrap();

		assert_eq!(adapter.node_overrides(&"n1".into()).map(|t| t.to_json()), Some(json!({"x": 2})));
		assert_eq!(adapter.node_overrides(&"n2".into()).map(|t| t.to_json()), Some(json!({"y": 1})));
	}

	#[tokio::test]
	async fn test_failure_injection() {
		let adapter = MemoryLayerAdapter::new();
		adapter.fail_loads(true);
		assert!(adapter.load_layers(&Scope::Network).await.is_err());

		adapter.fail_submits(true);
		let res = adapter.submit_overrides(&OverrideSubmission::Network(ConfigTree::new())).await;
		assert!(matches!(res, Err(Error::DbError)));
		assert!(adapter.submissions().is_empty());
		assert_eq!(adapter.network_overrides(), None);
	}
}

// vim: ts=4
