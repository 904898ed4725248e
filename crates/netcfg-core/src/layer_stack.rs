//! Ordered configuration layers of one scope

use std::sync::Arc;

use netcfg_types::layer_adapter::LayerAdapter;

use crate::prelude::*;

/// Layers of one scope in ascending precedence, with exactly one editable layer
#[derive(Debug, Clone)]
pub struct LayerStack {
	scope: Scope,
	layers: Vec<Layer>,
	editable: usize,
}

impl LayerStack {
	/// Load the committed layers of a scope through the adapter
	pub async fn load(adapter: &Arc<dyn LayerAdapter>, scope: &Scope) -> NcResult<Self> {
		let layers = adapter.load_layers(scope).await?;
		let stack = Self::from_layers(scope.clone(), layers)?;
		debug!("Loaded {} layers for {}", stack.layers.len(), scope);
		Ok(stack)
	}

	/// Build a stack from layers in any order. Duplicate layers and layers that
	/// do not belong to the scope make the whole scope corrupt. A missing
	/// editable layer is created empty.
	pub fn from_layers(scope: Scope, mut layers: Vec<Layer>) -> NcResult<Self> {
		layers.sort_by_key(Layer::precedence_rank);

		for pair in layers.windows(2) {
			if pair[0].id == pair[1].id {
				return Err(Error::CorruptLayer(format!("duplicate layer {} in {}", pair[0].id, scope)));
			}
		}
		if let Some(layer) = layers.iter().find(|layer| !scope.admits(layer.id)) {
			return Err(Error::CorruptLayer(format!("layer {} is not allowed in {}", layer.id, scope)));
		}

		let editable_id = scope.editable_layer();
		if !layers.iter().any(|layer| layer.id == editable_id) {
			layers.push(Layer::empty(editable_id));
			layers.sort_by_key(Layer::precedence_rank);
		}
		for layer in &mut layers {
			layer.mutable = layer.id == editable_id;
		}

		let editable = layers
			.iter()
			.position(|layer| layer.id == editable_id)
			.ok_or_else(|| Error::Internal("editable layer missing".into()))?;

		Ok(Self { scope, layers, editable })
	}

	pub fn scope(&self) -> &Scope {
		&self.scope
	}

	pub fn layers(&self) -> &[Layer] {
		&self.layers
	}

	pub fn len(&self) -> usize {
		self.layers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}

	/// Scalar of each layer at `path`, `None` where structurally absent
	pub fn values_at(&self, path: &Path) -> Vec<Option<&Scalar>> {
		self.layers.iter().map(|layer| layer.tree.get_scalar(path)).collect()
	}

	pub fn editable_index(&self) -> usize {
		self.editable
	}

	pub fn editable_layer(&self) -> &Layer {
		&self.layers[self.editable]
	}

	pub fn editable_tree(&self) -> &ConfigTree {
		&self.layers[self.editable].tree
	}

	pub fn layer_index(&self, id: LayerId) -> Option<usize> {
		self.layers.iter().position(|layer| layer.id == id)
	}

	pub fn layer(&self, id: LayerId) -> Option<&Layer> {
		self.layers.iter().find(|layer| layer.id == id)
	}

	/// All layers merged in precedence order
	pub fn effective_tree(&self) -> ConfigTree {
		self.layers.iter().fold(ConfigTree::new(), |mut acc, layer| {
			acc.merge(&layer.tree);
			acc
		})
	}

	/// Replace the editable layer with a committed tree
	pub fn promote(&mut self, tree: ConfigTree) {
		self.layers[self.editable].tree = tree;
	}
}


// vim: ts=4
