use netcfg_layer_adapter_redb::{AdapterConfig, LayerAdapterRedb, NodeProfile};
use netcfg_types::layer_adapter::{LayerAdapter, OverrideSubmission};
use netcfg_types::prelude::*;
use serde_json::json;
use std::collections::BTreeMap;
use tempfile::TempDir;

/// Helper to create a temporary layer store for testing
async fn create_test_adapter() -> (LayerAdapterRedb, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = LayerAdapterRedb::new(temp_dir.path().join("layers.redb"), AdapterConfig::default())
		.await
		.expect("Failed to create adapter");
	(adapter, temp_dir)
}

fn tree(value: serde_json::Value) -> ConfigTree {
	ConfigTree::from_json(value).expect("Invalid tree")
}

fn layer<'a>(layers: &'a [Layer], id: LayerId) -> Option<&'a Layer> {
	layers.iter().find(|layer| layer.id == id)
}

#[tokio::test]
async fn test_empty_store() {
	let (adapter, _temp) = create_test_adapter().await;
	let layers = adapter.load_layers(&Scope::Network).await.expect("Failed to load");

	let ids: Vec<LayerId> = layers.iter().map(|l| l.id).collect();
	assert_eq!(ids, vec![LayerId::Base, LayerId::HardwareBase, LayerId::FirmwareBase]);
	assert!(layers.iter().all(|l| l.tree.is_empty()));
}

#[tokio::test]
async fn test_node_scope_selects_bases_from_profile() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.put_base("default", &tree(json!({"v": "default"}))).await.unwrap();
	adapter.put_base("M80", &tree(json!({"v": "M80"}))).await.unwrap();
	adapter.put_hardware_base("NXP", "M80", &tree(json!({"hw": "NXP"}))).await.unwrap();
	adapter.put_firmware_base("none", &tree(json!({"fw": "none"}))).await.unwrap();

	let n1 = NodeId::from("n1");
	let profile = NodeProfile {
		sw_version: Some("M80".into()),
		hw_board_id: Some("NXP".into()),
		fw_version: Some("10.11".into()),
	};
	adapter.put_node_profile(&n1, &profile).await.unwrap();
	assert_eq!(adapter.node_profile(&n1).await.unwrap(), Some(profile));

	let layers = adapter.load_layers(&Scope::Node(n1)).await.unwrap();
	assert_eq!(layer(&layers, LayerId::Base).unwrap().tree.to_json(), json!({"v": "M80"}));
	assert_eq!(layer(&layers, LayerId::HardwareBase).unwrap().tree.to_json(), json!({"hw": "NXP"}));
	// unknown firmware falls back to the default key
	assert_eq!(layer(&layers, LayerId::FirmwareBase).unwrap().tree.to_json(), json!({"fw": "none"}));

	// a node without a profile runs the default bases
	let layers = adapter.load_layers(&Scope::Node("n2".into())).await.unwrap();
	assert_eq!(layer(&layers, LayerId::Base).unwrap().tree.to_json(), json!({"v": "default"}));
}

#[tokio::test]
async fn test_override_layers_by_scope() {
	let (adapter, _temp) = create_test_adapter().await;
	let n1 = NodeId::from("n1");
	adapter.put_auto_overrides(&n1, &tree(json!({"auto": 1}))).await.unwrap();
	adapter
		.submit_overrides(&OverrideSubmission::Network(tree(json!({"net": 1}))))
		.await
		.unwrap();
	adapter
		.submit_overrides(&OverrideSubmission::Nodes(BTreeMap::from([(
			n1.clone(),
			tree(json!({"node": 1})),
		)])))
		.await
		.unwrap();

	let network = adapter.load_layers(&Scope::Network).await.unwrap();
	assert!(layer(&network, LayerId::Network).is_some());
	assert!(layer(&network, LayerId::AutoNode).is_none());
	assert!(layer(&network, LayerId::Node).is_none());

	let node = adapter.load_layers(&Scope::Node(n1)).await.unwrap();
	assert_eq!(layer(&node, LayerId::AutoNode).unwrap().tree.to_json(), json!({"auto": 1}));
	assert_eq!(layer(&node, LayerId::Node).unwrap().tree.to_json(), json!({"node": 1}));
	assert!(layer(&node, LayerId::Node).unwrap().mutable);
	assert!(!layer(&node, LayerId::AutoNode).unwrap().mutable);
}

#[tokio::test]
async fn test_node_submission_keeps_other_nodes() {
	let (adapter, _temp) = create_test_adapter().await;
	let (n1, n2) = (NodeId::from("n1"), NodeId::from("n2"));
	adapter
		.submit_overrides(&OverrideSubmission::Nodes(BTreeMap::from([
			(n1.clone(), tree(json!({"x": 1}))),
			(n2.clone(), tree(json!({"x": 2}))),
		])))
		.await
		.unwrap();
	adapter
		.submit_overrides(&OverrideSubmission::Nodes(BTreeMap::from([(
			n1.clone(),
			tree(json!({"x": 10})),
		)])))
		.await
		.unwrap();

	assert_eq!(adapter.node_overrides(&n1).await.unwrap().map(|t| t.to_json()), Some(json!({"x": 10})));
	assert_eq!(adapter.node_overrides(&n2).await.unwrap().map(|t| t.to_json()), Some(json!({"x": 2})));
}

#[tokio::test]
async fn test_network_submission_replaces_tree() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter
		.submit_overrides(&OverrideSubmission::Network(tree(json!({"a": 1, "b": 2}))))
		.await
		.unwrap();
	adapter.submit_overrides(&OverrideSubmission::Network(tree(json!({"b": 3})))).await.unwrap();
	assert_eq!(adapter.network_overrides().await.unwrap().map(|t| t.to_json()), Some(json!({"b": 3})));
}

#[tokio::test]
async fn test_store_survives_reopen() {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let path = temp_dir.path().join("nested").join("layers.redb");
	{
		let adapter = LayerAdapterRedb::new(path.clone(), AdapterConfig::default()).await.unwrap();
		adapter
			.submit_overrides(&OverrideSubmission::Network(tree(json!({"a": 1}))))
			.await
			.unwrap();
	}
	let adapter = LayerAdapterRedb::new(path, AdapterConfig::default()).await.unwrap();
	assert_eq!(adapter.network_overrides().await.unwrap().map(|t| t.to_json()), Some(json!({"a": 1})));
}

#[tokio::test]
async fn test_invalid_keys_are_rejected() {
	let (adapter, _temp) = create_test_adapter().await;
	assert!(matches!(
		adapter.put_base("a/b", &ConfigTree::new()).await,
		Err(Error::ConfigError(_))
	));
	let res = adapter
		.submit_overrides(&OverrideSubmission::Nodes(BTreeMap::from([(
			NodeId::from("bad/node"),
			ConfigTree::new(),
		)])))
		.await;
	assert!(res.is_err());
}

// vim: ts=4
