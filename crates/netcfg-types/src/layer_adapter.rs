//! Adapter that loads configuration layers and persists override layers.
//!
//! This is the only I/O boundary of the engine. Implementations are free to
//! store layers anywhere (a database, a controller API, memory) as long as the
//! submission semantics below hold.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::prelude::*;

/// Override data to persist
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverrideSubmission {
	/// Replaces the whole network override layer
	Network(ConfigTree),
	/// Replaces the node override layer of each listed node. Nodes not listed
	/// keep their stored overrides.
	Nodes(BTreeMap<NodeId, ConfigTree>),
}

impl OverrideSubmission {
	/// The scopes this submission writes to
	pub fn scopes(&self) -> Vec<Scope> {
		match self {
			OverrideSubmission::Network(_) => vec![Scope::Network],
			OverrideSubmission::Nodes(nodes) => {
				nodes.keys().map(|id| Scope::Node(id.clone())).collect()
			}
		}
	}

	pub fn is_empty(&self) -> bool {
		match self {
			OverrideSubmission::Network(_) => false,
			OverrideSubmission::Nodes(nodes) => nodes.is_empty(),
		}
	}
}

#[async_trait]
pub trait LayerAdapter: Debug + Send + Sync {
	/// Loads the committed layers of a scope, in any order. Layers the store
	/// knows nothing about may be omitted.
	async fn load_layers(&self, scope: &Scope) -> NcResult<Vec<Layer>>;

	/// Persists override layers atomically: either every tree of the
	/// submission is stored or none is.
	async fn submit_overrides(&self, submission: &OverrideSubmission) -> NcResult<()>;
}

// vim: ts=4
