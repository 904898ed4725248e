//! Setting definitions and the registry
//!
//! A definition describes one configuration key: its data type, the validators
//! run on non-blank values, and UI hints such as restart-required or feature
//! toggle. The registry is filled during engine assembly and frozen before use.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use super::validate::{DataType, ValidatorId};
use crate::prelude::*;

/// Type alias for a custom setting validator working on the raw text value
pub type SettingValidator = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// Setting definition - metadata for one configuration key
#[derive(Clone)]
pub struct SettingDefinition {
	/// Dot-separated key (e.g., "envParams.OPENR_USE_FIB_NSS"), or a
	/// "prefix.*" wildcard matching every key under the prefix
	pub key: String,

	/// Human-readable description
	pub description: String,

	pub data_type: DataType,

	/// Named validators run in order on non-blank values
	pub validators: Vec<ValidatorId>,

	/// Changing this setting takes effect only after a node restart
	pub requires_restart: bool,

	/// Rendered as an on/off toggle (BOOL only)
	pub is_feature_toggle: bool,

	/// Effective state of a feature toggle with no value in any layer
	pub default_enabled: bool,

	/// Optional custom validation function
	pub validator: Option<SettingValidator>,
}

impl Debug for SettingDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingDefinition")
			.field("key", &self.key)
			.field("description", &self.description)
			.field("data_type", &self.data_type)
			.field("validators", &self.validators)
			.field("requires_restart", &self.requires_restart)
			.field("is_feature_toggle", &self.is_feature_toggle)
			.field("default_enabled", &self.default_enabled)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl SettingDefinition {
	/// Create a builder for constructing a SettingDefinition
	pub fn builder(key: impl Into<String>) -> SettingDefinitionBuilder {
		SettingDefinitionBuilder::new(key)
	}

	pub fn is_wildcard(&self) -> bool {
		self.key.ends_with(".*")
	}

	pub fn is_secret(&self) -> bool {
		self.data_type.is_secret()
	}

	/// Validate a raw, non-blank value against this definition
	pub fn check(&self, raw: &str) -> Result<(), String> {
		self.data_type.check(raw)?;
		for validator in &self.validators {
			validator.check(raw)?;
		}
		if let Some(validator) = &self.validator {
			validator(raw)?;
		}
		Ok(())
	}
}

/// Builder for SettingDefinition with fluent API
pub struct SettingDefinitionBuilder {
	key: String,
	description: Option<String>,
	data_type: DataType,
	validators: Vec<ValidatorId>,
	requires_restart: bool,
	is_feature_toggle: bool,
	default_enabled: bool,
	validator: Option<SettingValidator>,
}

impl SettingDefinitionBuilder {
	pub fn new(key: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			description: None,
			data_type: DataType::String,
			validators: Vec::new(),
			requires_restart: false,
			is_feature_toggle: false,
			default_enabled: false,
			validator: None,
		}
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Set the data type (defaults to String)
	pub fn data_type(mut self, data_type: DataType) -> Self {
		self.data_type = data_type;
		self
	}

	/// Append a named validator
	pub fn validate(mut self, validator: ValidatorId) -> Self {
		self.validators.push(validator);
		self
	}

	pub fn requires_restart(mut self, requires_restart: bool) -> Self {
		self.requires_restart = requires_restart;
		self
	}

	/// Mark as feature toggle with its default state
	pub fn feature_toggle(mut self, default_enabled: bool) -> Self {
		self.is_feature_toggle = true;
		self.default_enabled = default_enabled;
		self
	}

	/// Set a validation function
	pub fn validator<F>(mut self, f: F) -> Self
	where
		F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Arc::new(f));
		self
	}

	/// Build the SettingDefinition
	pub fn build(self) -> NcResult<SettingDefinition> {
		let key = self.key.trim().to_string();
		if key.is_empty() || Path::parse(&key).is_root() {
			return Err(Error::ConfigError("Setting key must not be empty".into()));
		}

		// "*" is only allowed as the last segment
		let segments: Vec<&str> = key.split('.').collect();
		if let Some((_, parents)) = segments.split_last()
			&& parents.contains(&"*")
		{
			return Err(Error::ConfigError(format!(
				"Setting '{}' may only use '*' as its last segment",
				key
			)));
		}
		if key == "*" {
			return Err(Error::ConfigError("A wildcard setting needs a prefix".into()));
		}

		if self.is_feature_toggle && self.data_type != DataType::Bool {
			return Err(Error::ConfigError(format!(
				"Feature toggle '{}' must have the BOOL data type",
				key
			)));
		}

		Ok(SettingDefinition {
			key,
			description: self.description.unwrap_or_default(),
			data_type: self.data_type,
			validators: self.validators,
			requires_restart: self.requires_restart,
			is_feature_toggle: self.is_feature_toggle,
			default_enabled: self.default_enabled,
			validator: self.validator,
		})
	}
}

/// Mutable registry used during engine assembly
pub struct SettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
}

impl SettingsRegistry {
	pub fn new() -> Self {
		Self { definitions: HashMap::new() }
	}

	/// Register a new setting definition
	pub fn register(&mut self, def: SettingDefinition) -> NcResult<()> {
		if self.definitions.contains_key(&def.key) {
			return Err(Error::ConfigError(format!("Setting '{}' is already registered", def.key)));
		}

		debug!("Registering setting: {}", def.key);
		self.definitions.insert(def.key.clone(), def);
		Ok(())
	}

	/// Register several definitions, stopping at the first duplicate
	pub fn register_all(
		&mut self,
		defs: impl IntoIterator<Item = SettingDefinition>,
	) -> NcResult<()> {
		for def in defs {
			self.register(def)?;
		}
		Ok(())
	}

	/// Freeze the registry (make it immutable)
	pub fn freeze(self) -> FrozenSettingsRegistry {
		info!("Freezing settings registry with {} definitions", self.definitions.len());
		FrozenSettingsRegistry { definitions: self.definitions }
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}
}

impl Default for SettingsRegistry {
	fn default() -> Self {
		Self::new()
	}
}

/// Immutable registry shared by the editor and the commit coordinator
#[derive(Debug)]
pub struct FrozenSettingsRegistry {
	definitions: HashMap<String, SettingDefinition>,
}

impl FrozenSettingsRegistry {
	/// Get a setting definition by key
	/// First tries exact match, then "<prefix>.*" wildcards from the longest
	/// prefix to the shortest
	pub fn get(&self, key: &str) -> Option<&SettingDefinition> {
		if let Some(def) = self.definitions.get(key) {
			return Some(def);
		}

		let mut prefix = key;
		while let Some(dot_pos) = prefix.rfind('.') {
			prefix = &prefix[..dot_pos];
			if let Some(def) = self.definitions.get(&format!("{}.*", prefix)) {
				return Some(def);
			}
		}

		None
	}

	pub fn get_path(&self, path: &Path) -> Option<&SettingDefinition> {
		self.get(&path.to_string())
	}

	/// List all registered settings
	pub fn list(&self) -> impl Iterator<Item = &SettingDefinition> {
		self.definitions.values()
	}

	/// List settings with a specific prefix
	pub fn list_by_prefix<'a>(
		&'a self,
		prefix: &'a str,
	) -> Box<dyn Iterator<Item = &'a SettingDefinition> + 'a> {
		Box::new(self.definitions.values().filter(move |def| def.key.starts_with(prefix)))
	}

	pub fn len(&self) -> usize {
		self.definitions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.definitions.is_empty()
	}

	/// Validate a raw value for a key. Blank values always pass; keys without a
	/// definition are free-form text.
	pub fn validate(&self, key: &str, raw: &str) -> Result<(), String> {
		if raw.trim().is_empty() {
			return Ok(());
		}
		match self.get(key) {
			Some(def) => def.check(raw),
			None => {
				debug!("No definition for '{}', accepting as free text", key);
				Ok(())
			}
		}
	}

	pub fn requires_restart(&self, key: &str) -> bool {
		self.get(key).is_some_and(|def| def.requires_restart)
	}
}


// vim: ts=4
