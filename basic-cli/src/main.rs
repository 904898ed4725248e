//! Prints the effective configuration of one scope, with the provenance of
//! every field, as JSON.

use std::process::ExitCode;
use std::sync::Arc;
use std::{env, path};

use netcfg::Engine;
use netcfg::prelude::*;
use netcfg_layer_adapter_redb::{AdapterConfig, LayerAdapterRedb};

pub struct Config {
	pub db_dir: path::PathBuf,
	pub scope: Scope,
	/// Settings metadata document (JSON)
	pub settings: Option<path::PathBuf>,
}

fn parse_scope(scope: &str) -> NcResult<Scope> {
	match scope.split_once(':') {
		None if scope == "network" => Ok(Scope::Network),
		Some(("node", node)) if !node.is_empty() => Ok(Scope::Node(NodeId::from(node))),
		_ => Err(Error::ConfigError(format!("invalid scope '{}', use 'network' or 'node:<name>'", scope))),
	}
}

impl Config {
	fn from_env() -> NcResult<Self> {
		Ok(Config {
			db_dir: path::PathBuf::from(env::var("DB_DIR").unwrap_or("./data".to_string())),
			scope: parse_scope(&env::var("NETCFG_SCOPE").unwrap_or("network".to_string()))?,
			settings: env::var("NETCFG_SETTINGS").ok().map(path::PathBuf::from),
		})
	}
}

fn to_json<T: serde::Serialize>(value: &T) -> NcResult<serde_json::Value> {
	serde_json::to_value(value).map_err(|err| Error::Internal(err.to_string()))
}

async fn run(config: Config) -> NcResult<()> {
	let layer_adapter =
		LayerAdapterRedb::new(config.db_dir.join("layers.redb"), AdapterConfig::default()).await?;

	let mut builder = Engine::builder();
	builder.layer_adapter(Arc::new(layer_adapter));
	if let Some(settings) = &config.settings {
		let text = tokio::fs::read_to_string(settings).await?;
		let metadata: serde_json::Value = serde_json::from_str(&text)
			.map_err(|err| Error::ConfigError(format!("{}: {}", settings.display(), err)))?;
		builder.settings_metadata(&metadata);
	}
	let engine = builder.build()?;

	let mut editor = engine.editor();
	match &config.scope {
		Scope::Network => editor.open_network().await?,
		Scope::Node(node) => editor.open_nodes(std::slice::from_ref(node)).await?,
	}

	let tree = editor.effective_tree(&config.scope).ok_or(Error::NotFound)?;
	let mut fields = serde_json::Map::new();
	for (path, _) in tree.leaves() {
		if let Some(input) = editor.input(&path) {
			fields.insert(path.to_string(), to_json(&input)?);
		}
	}

	let output = serde_json::json!({
		"scope": config.scope.to_string(),
		"config": tree.to_json(),
		"fields": fields,
	});
	let text = serde_json::to_string_pretty(&output).map_err(|err| Error::Internal(err.to_string()))?;
	println!("{}", text);
	Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_target(false)
		.with_writer(std::io::stderr)
		.init();

	let result = match Config::from_env() {
		Ok(config) => run(config).await,
		Err(err) => Err(err),
	};
	match result {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("FATAL: {}", err);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
