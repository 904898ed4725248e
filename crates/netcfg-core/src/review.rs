//! Pre-commit review of pending changes

use serde::Serialize;

use crate::diff;
use crate::prelude::*;
use crate::settings::FrozenSettingsRegistry;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEntry {
	pub path: Path,
	/// Committed override, `None` when there was none
	pub old_value: Option<String>,
	/// Override after commit, `None` when it is removed
	pub new_value: Option<String>,
	pub is_secret: bool,
	pub requires_restart: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
	pub scope: Scope,
	pub entries: Vec<ReviewEntry>,
}

impl Review {
	/// Compare the committed editable layer with the one about to be submitted
	pub fn build(
		scope: Scope,
		original: &ConfigTree,
		changed: &ConfigTree,
		registry: &FrozenSettingsRegistry,
	) -> Self {
		let entries = diff::changed_paths(original, changed)
			.into_iter()
			.map(|path| {
				let def = registry.get_path(&path);
				let is_secret = def.is_some_and(|def| def.is_secret());
				let show = |tree: &ConfigTree| {
					tree.get_scalar(&path).map(|value| {
						let text = value.to_string();
						if is_secret { mask(&text) } else { text }
					})
				};
				ReviewEntry {
					old_value: show(original),
					new_value: show(changed),
					is_secret,
					requires_restart: def.is_some_and(|def| def.requires_restart),
					path,
				}
			})
			.collect();
		Self { scope, entries }
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Changed paths that only take effect after a restart
	pub fn restart_required(&self) -> Vec<&Path> {
		self.entries.iter().filter(|entry| entry.requires_restart).map(|entry| &entry.path).collect()
	}
}

fn mask(text: &str) -> String {
	"*".repeat(text.chars().count())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::settings::{DataType, SettingDefinition, SettingsRegistry};
	use serde_json::json;

	fn registry() -> FrozenSettingsRegistry {
		let mut registry = SettingsRegistry::new();
		registry
			.register(
				SettingDefinition::builder("auth.secret")
					.data_type(DataType::SecretString)
					.build()
					.unwrap(),
			)
			.unwrap();
		registry
			.register(
				SettingDefinition::builder("sys.port")
					.data_type(DataType::Int)
					.requires_restart(true)
					.build()
					.unwrap(),
			)
			.unwrap();
		registry.freeze()
	}

	#[test]
	fn test_review_entries() {
		let original = ConfigTree::from_json(json!({"auth": {"secret": "abc"}, "name": "x"})).unwrap();
		let changed =
			ConfigTree::from_json(json!({"auth": {"secret": "hunter22"}, "sys": {"port": 80}}))
				.unwrap();
		let review = Review::build(Scope::Network, &original, &changed, &registry());

		let paths: Vec<String> = review.entries.iter().map(|e| e.path.to_string()).collect();
		assert_eq!(paths, vec!["auth.secret", "name", "sys.port"]);

		let secret = &review.entries[0];
		assert!(secret.is_secret);
		assert_eq!(secret.old_value.as_deref(), Some("***"));
		assert_eq!(secret.new_value.as_deref(), Some("********"));

		let removed = &review.entries[1];
		assert_eq!(removed.old_value.as_deref(), Some("x"));
		assert_eq!(removed.new_value, None);

		assert_eq!(review.restart_required(), vec![&Path::parse("sys.port")]);
	}
}

// vim: ts=4
