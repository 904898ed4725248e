//! Settings subsystem: per-key metadata and value validation

pub mod metadata;
pub mod types;
pub mod validate;

pub use metadata::load_definitions;
pub use types::{
	FrozenSettingsRegistry, SettingDefinition, SettingDefinitionBuilder, SettingValidator,
	SettingsRegistry,
};
pub use validate::{DataType, ValidationError, ValidatorId};

// vim: ts=4
