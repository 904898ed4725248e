//! Setting definitions loaded from JSON metadata
//!
//! Metadata comes from outside the engine, either as an array of records or as
//! an object keyed by setting key. A malformed record never fails the load: it
//! is logged and skipped, and its field degrades to free text.

use serde::Deserialize;

use super::types::SettingDefinition;
use super::validate::{DataType, ValidatorId};
use crate::prelude::*;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetadataRecord {
	#[serde(default)]
	key: Option<String>,
	#[serde(default, alias = "desc")]
	description: Option<String>,
	#[serde(default)]
	data_type: Option<DataType>,
	#[serde(default)]
	validations: Vec<ValidatorId>,
	#[serde(default)]
	requires_restart: bool,
	#[serde(default)]
	is_feature_toggle: bool,
	#[serde(default)]
	default_enabled: bool,
}

impl MetadataRecord {
	fn into_definition(self, fallback_key: Option<&str>) -> NcResult<SettingDefinition> {
		let key = self
			.key
			.or_else(|| fallback_key.map(str::to_string))
			.ok_or_else(|| Error::ConfigError("metadata record without a key".into()))?;

		let mut builder = SettingDefinition::builder(key)
			.data_type(self.data_type.unwrap_or(DataType::String))
			.requires_restart(self.requires_restart);
		if let Some(description) = self.description {
			builder = builder.description(description);
		}
		for validator in self.validations {
			builder = builder.validate(validator);
		}
		if self.is_feature_toggle {
			builder = builder.feature_toggle(self.default_enabled);
		}
		builder.build()
	}
}

fn parse_record(value: &serde_json::Value, fallback_key: Option<&str>) -> NcResult<SettingDefinition> {
	let record = MetadataRecord::deserialize(value)
		.map_err(|err| Error::ConfigError(format!("malformed metadata record: {}", err)))?;
	record.into_definition(fallback_key)
}

/// Parse setting definitions from a metadata document, skipping bad records
pub fn load_definitions(metadata: &serde_json::Value) -> Vec<SettingDefinition> {
	let results: Vec<(String, NcResult<SettingDefinition>)> = match metadata {
		serde_json::Value::Array(records) => records
			.iter()
			.enumerate()
			.map(|(idx, record)| (format!("#{}", idx), parse_record(record, None)))
			.collect(),
		serde_json::Value::Object(records) => records
			.iter()
			.map(|(key, record)| (key.clone(), parse_record(record, Some(key))))
			.collect(),
		other => {
			warn!("Settings metadata must be an array or an object, got {}", other);
			return Vec::new();
		}
	};

	let mut definitions = Vec::with_capacity(results.len());
	for (name, result) in results {
		match result {
			Ok(def) => definitions.push(def),
			Err(err) => warn!("Skipping settings metadata record {}: {}", name, err),
		}
	}
	debug!("Loaded {} setting definitions from metadata", definitions.len());
	definitions
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_load_array() {
		let defs = load_definitions(&json!([
			{
				"key": "sysParams.port",
				"dataType": "INT",
				"validations": ["PORT"],
				"requiresRestart": true
			},
			{
				"key": "features.mapV2",
				"dataType": "BOOL",
				"isFeatureToggle": true,
				"defaultEnabled": true
			}
		]));
		assert_eq!(defs.len(), 2);
		assert_eq!(defs[0].data_type, DataType::Int);
		assert_eq!(defs[0].validators, vec![ValidatorId::Port]);
		assert!(defs[0].requires_restart);
		assert!(defs[1].is_feature_toggle);
		assert!(defs[1].default_enabled);
	}

	#[test]
	fn test_load_object_uses_keys() {
		let defs = load_definitions(&json!({
			"envParams.SECRET": {"dataType": "SECRET_STRING", "desc": "api key"}
		}));
		assert_eq!(defs.len(), 1);
		assert_eq!(defs[0].key, "envParams.SECRET");
		assert_eq!(defs[0].description, "api key");
		assert!(defs[0].is_secret());
	}

	#[test]
	fn test_malformed_records_are_skipped() {
		let defs = load_definitions(&json!([
			{"key": "ok"},
			{"key": "bad.type", "dataType": "COMPLEX"},
			{"dataType": "INT"},
			{"key": "toggle", "isFeatureToggle": true},
			"not a record"
		]));
		let keys: Vec<&str> = defs.iter().map(|d| d.key.as_str()).collect();
		assert_eq!(keys, vec!["ok"]);

		assert!(load_definitions(&json!("flat")).is_empty());
	}
}

// vim: ts=4
