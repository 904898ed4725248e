//! Engine builder - assembles the settings registry, the layer adapter and the
//! commit coordinator

use std::sync::Arc;

use netcfg_core::commit::CommitCoordinator;
use netcfg_core::editor::ConfigEditor;
use netcfg_core::settings::{
	FrozenSettingsRegistry, SettingDefinition, SettingsRegistry, load_definitions,
};
use netcfg_types::layer_adapter::LayerAdapter;

use crate::prelude::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct EngineBuilder {
	layer_adapter: Option<Arc<dyn LayerAdapter>>,
	definitions: Vec<SettingDefinition>,
}

impl EngineBuilder {
	pub fn new() -> Self {
		EngineBuilder { layer_adapter: None, definitions: Vec::new() }
	}

	pub fn layer_adapter(&mut self, layer_adapter: Arc<dyn LayerAdapter>) -> &mut Self {
		self.layer_adapter = Some(layer_adapter);
		self
	}

	/// Add a setting definition. Duplicate keys are reported by `build`.
	pub fn register(&mut self, def: SettingDefinition) -> &mut Self {
		self.definitions.push(def);
		self
	}

	/// Add the definitions found in a JSON metadata document. Malformed
	/// records are skipped.
	pub fn settings_metadata(&mut self, metadata: &serde_json::Value) -> &mut Self {
		self.definitions.extend(load_definitions(metadata));
		self
	}

	pub fn build(self) -> NcResult<Engine> {
		let Some(layer_adapter) = self.layer_adapter else {
			error!("FATAL: No layer adapter configured");
			return Err(Error::Internal("No layer adapter configured".to_string()));
		};

		let mut settings_registry = SettingsRegistry::new();
		settings_registry.register_all(self.definitions)?;
		info!("Registered {} settings", settings_registry.len());
		let registry = Arc::new(settings_registry.freeze());

		let coordinator = CommitCoordinator::new(registry.clone(), layer_adapter.clone());
		info!("netcfg engine V{} ready", VERSION);
		Ok(Engine { registry, layer_adapter, coordinator })
	}
}

impl Default for EngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// An assembled engine. Cheap to share; every editor gets its own drafts.
#[derive(Debug, Clone)]
pub struct Engine {
	registry: Arc<FrozenSettingsRegistry>,
	layer_adapter: Arc<dyn LayerAdapter>,
	coordinator: CommitCoordinator,
}

impl Engine {
	pub fn builder() -> EngineBuilder {
		EngineBuilder::new()
	}

	/// A new editor with no scope open
	pub fn editor(&self) -> ConfigEditor {
		ConfigEditor::new(self.layer_adapter.clone(), self.registry.clone())
	}

	pub fn coordinator(&self) -> &CommitCoordinator {
		&self.coordinator
	}

	pub fn registry(&self) -> &Arc<FrozenSettingsRegistry> {
		&self.registry
	}

	pub fn layer_adapter(&self) -> &Arc<dyn LayerAdapter> {
		&self.layer_adapter
	}
}


// vim: ts=4
