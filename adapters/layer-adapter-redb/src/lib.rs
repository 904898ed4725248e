#![forbid(unsafe_code)]

mod error;
pub mod storage;

use async_trait::async_trait;
use redb::{ReadableDatabase, ReadableTable};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub use error::Error;
pub use storage::NodeProfile;

use netcfg_types::layer_adapter::{LayerAdapter, OverrideSubmission};
use netcfg_types::prelude::*;

/// Adapter configuration options
#[derive(Debug, Clone)]
pub struct AdapterConfig {
	/// BASE key used when a node's software version is unknown or has no base
	pub default_base: String,

	/// Board id used when a node's hardware base is unknown or missing
	pub default_hardware_base: String,

	/// FIRMWARE_BASE key used when a node's firmware version is unknown
	pub default_firmware_base: String,
}

impl Default for AdapterConfig {
	fn default() -> Self {
		Self {
			default_base: "default".into(),
			default_hardware_base: "default".into(),
			default_firmware_base: "none".into(),
		}
	}
}

/// redb-based implementation of LayerAdapter.
///
/// Base layers are shared and selected per node from its stored
/// [`NodeProfile`]; the network scope always uses the default bases.
#[derive(Debug)]
pub struct LayerAdapterRedb {
	db: Arc<redb::Database>,
	config: AdapterConfig,
}

fn read_tree(
	table: &impl ReadableTable<&'static str, &'static str>,
	key: &str,
) -> NcResult<Option<ConfigTree>> {
	match table.get(key).map_err(error::from_redb_error)? {
		Some(v) => {
			let value: serde_json::Value = serde_json::from_str(v.value()).map_err(Error::from)?;
			ConfigTree::from_json(value)
				.map(Some)
				.map_err(|err| Error::JsonError(format!("{}: {}", key, err)).into())
		}
		None => Ok(None),
	}
}

impl LayerAdapterRedb {
	/// Open (or create) the layer store at `db_path`
	pub async fn new(db_path: PathBuf, config: AdapterConfig) -> NcResult<Self> {
		if let Some(parent) = db_path.parent() {
			tokio::fs::create_dir_all(parent).await?;
		}

		let db = tokio::task::spawn_blocking(move || -> NcResult<redb::Database> {
			let db = if db_path.exists() {
				redb::Database::open(&db_path).map_err(error::from_redb_error)?
			} else {
				redb::Database::create(&db_path).map_err(error::from_redb_error)?
			};

			// Initialize tables
			let tx = db.begin_write().map_err(error::from_redb_error)?;
			let _ = tx.open_table(storage::TABLE_LAYERS).map_err(error::from_redb_error)?;
			let _ = tx.open_table(storage::TABLE_NODES).map_err(error::from_redb_error)?;
			tx.commit().map_err(error::from_redb_error)?;
			Ok(db)
		})
		.await
		.map_err(Error::from)??;

		info!("Opened layer store");
		Ok(Self { db: Arc::new(db), config })
	}

	async fn put(
		&self,
		table: redb::TableDefinition<'static, &'static str, &'static str>,
		key: String,
		value: String,
	) -> NcResult<()> {
		let db = self.db.clone();
		tokio::task::spawn_blocking(move || -> NcResult<()> {
			let tx = db.begin_write().map_err(error::from_redb_error)?;
			{
				let mut table = tx.open_table(table).map_err(error::from_redb_error)?;
				table.insert(key.as_str(), value.as_str()).map_err(error::from_redb_error)?;
			}
			tx.commit().map_err(error::from_redb_error)?;
			debug!("Stored {}", key);
			Ok(())
		})
		.await
		.map_err(Error::from)?
	}

	async fn put_tree(&self, key: String, tree: &ConfigTree) -> NcResult<()> {
		let value = serde_json::to_string(tree).map_err(Error::from)?;
		self.put(storage::TABLE_LAYERS, key, value).await
	}

	async fn get_tree(&self, key: String) -> NcResult<Option<ConfigTree>> {
		let db = self.db.clone();
		tokio::task::spawn_blocking(move || -> NcResult<Option<ConfigTree>> {
			let tx = db.begin_read().map_err(error::from_redb_error)?;
			let table = tx.open_table(storage::TABLE_LAYERS).map_err(error::from_redb_error)?;
			read_tree(&table, &key)
		})
		.await
		.map_err(Error::from)?
	}

	/// Store the BASE layer of a software version
	pub async fn put_base(&self, sw_version: &str, tree: &ConfigTree) -> NcResult<()> {
		let key = storage::base_key(storage::check_segment(sw_version)?);
		self.put_tree(key, tree).await
	}

	/// Store the HARDWARE_BASE layer of a board and software version
	pub async fn put_hardware_base(
		&self,
		hw_board_id: &str,
		sw_version: &str,
		tree: &ConfigTree,
	) -> NcResult<()> {
		let key = storage::hardware_key(
			storage::check_segment(hw_board_id)?,
			storage::check_segment(sw_version)?,
		);
		self.put_tree(key, tree).await
	}

	/// Store the FIRMWARE_BASE layer of a firmware version
	pub async fn put_firmware_base(&self, fw_version: &str, tree: &ConfigTree) -> NcResult<()> {
		let key = storage::firmware_key(storage::check_segment(fw_version)?);
		self.put_tree(key, tree).await
	}

	/// Store the auto-generated overrides of a node
	pub async fn put_auto_overrides(&self, node: &NodeId, tree: &ConfigTree) -> NcResult<()> {
		storage::check_segment(node.as_str())?;
		self.put_tree(storage::auto_key(node), tree).await
	}

	pub async fn put_node_profile(&self, node: &NodeId, profile: &NodeProfile) -> NcResult<()> {
		let key = storage::check_segment(node.as_str())?.to_string();
		let value = serde_json::to_string(profile).map_err(Error::from)?;
		self.put(storage::TABLE_NODES, key, value).await
	}

	pub async fn node_profile(&self, node: &NodeId) -> NcResult<Option<NodeProfile>> {
		let db = self.db.clone();
		let key = node.as_str().to_string();
		tokio::task::spawn_blocking(move || -> NcResult<Option<NodeProfile>> {
			let tx = db.begin_read().map_err(error::from_redb_error)?;
			let table = tx.open_table(storage::TABLE_NODES).map_err(error::from_redb_error)?;
			match table.get(key.as_str()).map_err(error::from_redb_error)? {
				Some(v) => Ok(Some(serde_json::from_str(v.value()).map_err(Error::from)?)),
				None => Ok(None),
			}
		})
		.await
		.map_err(Error::from)?
	}

	pub async fn network_overrides(&self) -> NcResult<Option<ConfigTree>> {
		self.get_tree(storage::NETWORK_KEY.to_string()).await
	}

	pub async fn node_overrides(&self, node: &NodeId) -> NcResult<Option<ConfigTree>> {
		self.get_tree(storage::node_key(node)).await
	}
}

#[async_trait]
impl LayerAdapter for LayerAdapterRedb {
	async fn load_layers(&self, scope: &Scope) -> NcResult<Vec<Layer>> {
		let profile = match scope {
			Scope::Network => NodeProfile::default(),
			Scope::Node(node) => self.node_profile(node).await?.unwrap_or_else(|| {
				debug!("No profile for node {}, using default bases", node);
				NodeProfile::default()
			}),
		};
		let candidates = storage::base_candidates(&profile, &self.config);
		let node = scope.node_id().cloned();
		let db = self.db.clone();

		tokio::task::spawn_blocking(move || -> NcResult<Vec<Layer>> {
			let tx = db.begin_read().map_err(error::from_redb_error)?;
			let table = tx.open_table(storage::TABLE_LAYERS).map_err(error::from_redb_error)?;

			let mut layers = Vec::new();
			for (id, keys) in candidates {
				let mut found = None;
				for key in &keys {
					if let Some(tree) = read_tree(&table, key)? {
						debug!("Using {} for {}", key, id);
						found = Some(tree);
						break;
					}
				}
				layers.push(Layer::new(id, found.unwrap_or_default()));
			}

			if let Some(tree) = read_tree(&table, storage::NETWORK_KEY)? {
				layers.push(Layer::new(LayerId::Network, tree));
			}
			if let Some(node) = node {
				if let Some(tree) = read_tree(&table, &storage::auto_key(&node))? {
					layers.push(Layer::new(LayerId::AutoNode, tree));
				}
				if let Some(tree) = read_tree(&table, &storage::node_key(&node))? {
					layers.push(Layer::new(LayerId::Node, tree));
				}
			}
			Ok(layers)
		})
		.await
		.map_err(Error::from)?
	}

	async fn submit_overrides(&self, submission: &OverrideSubmission) -> NcResult<()> {
		let mut records = Vec::new();
		match submission {
			OverrideSubmission::Network(tree) => {
				records.push((storage::NETWORK_KEY.to_string(), serde_json::to_string(tree).map_err(Error::from)?));
			}
			OverrideSubmission::Nodes(nodes) => {
				for (node, tree) in nodes {
					storage::check_segment(node.as_str())?;
					records.push((storage::node_key(node), serde_json::to_string(tree).map_err(Error::from)?));
				}
			}
		}

		let db = self.db.clone();
		tokio::task::spawn_blocking(move || -> NcResult<()> {
			// One write transaction: every record is stored or none is
			let tx = db.begin_write().map_err(error::from_redb_error)?;
			{
				let mut table = tx.open_table(storage::TABLE_LAYERS).map_err(error::from_redb_error)?;
				for (key, value) in &records {
					table.insert(key.as_str(), value.as_str()).map_err(error::from_redb_error)?;
				}
			}
			tx.commit().map_err(error::from_redb_error)?;
			info!("Stored {} override layer(s)", records.len());
			Ok(())
		})
		.await
		.map_err(Error::from)?
	}
}

// vim: ts=4
