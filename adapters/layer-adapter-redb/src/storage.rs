//! Table layout and key scheme of the layer store
//!
//! Every layer tree is stored as a JSON document in `TABLE_LAYERS`:
//!
//! | key                  | layer                                   |
//! |----------------------|-----------------------------------------|
//! | `base/<sw>`          | BASE for a software version             |
//! | `hw/<board>/<sw>`    | HARDWARE_BASE for a board and version   |
//! | `fw/<fw>`            | FIRMWARE_BASE for a firmware version    |
//! | `auto/<node>`        | AUTO_NODE of a node                     |
//! | `network`            | NETWORK overrides                       |
//! | `node/<node>`        | NODE overrides of a node                |
//!
//! Node profiles (which bases a node runs) live in `TABLE_NODES`.

use serde::{Deserialize, Serialize};

use netcfg_types::types::{LayerId, NodeId};

use crate::AdapterConfig;
use crate::error::Error;

/// Layer documents
pub const TABLE_LAYERS: redb::TableDefinition<&str, &str> = redb::TableDefinition::new("layers");

/// Node profiles
pub const TABLE_NODES: redb::TableDefinition<&str, &str> = redb::TableDefinition::new("nodes");

pub const NETWORK_KEY: &str = "network";

/// Software, hardware and firmware a node runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProfile {
	pub sw_version: Option<String>,
	pub hw_board_id: Option<String>,
	pub fw_version: Option<String>,
}

/// Key segments end up inside '/'-separated keys
pub fn check_segment(segment: &str) -> Result<&str, Error> {
	if segment.is_empty() || segment.contains('/') {
		return Err(Error::InvalidKey(format!("'{}' cannot be used as a key segment", segment)));
	}
	Ok(segment)
}

pub fn base_key(sw_version: &str) -> String {
	format!("base/{}", sw_version)
}

pub fn hardware_key(hw_board_id: &str, sw_version: &str) -> String {
	format!("hw/{}/{}", hw_board_id, sw_version)
}

pub fn firmware_key(fw_version: &str) -> String {
	format!("fw/{}", fw_version)
}

pub fn auto_key(node: &NodeId) -> String {
	format!("auto/{}", node)
}

pub fn node_key(node: &NodeId) -> String {
	format!("node/{}", node)
}

/// Candidate keys of each base layer, most specific first
pub fn base_candidates(profile: &NodeProfile, config: &AdapterConfig) -> Vec<(LayerId, Vec<String>)> {
	let sw = profile.sw_version.as_deref();
	let hw = profile.hw_board_id.as_deref();
	let fw = profile.fw_version.as_deref();
	let default_sw = config.default_base.as_str();
	let default_hw = config.default_hardware_base.as_str();

	let mut base = Vec::new();
	let mut hardware = Vec::new();
	let mut firmware = Vec::new();
	if let Some(sw) = sw {
		base.push(base_key(sw));
		if let Some(hw) = hw {
			hardware.push(hardware_key(hw, sw));
		}
		hardware.push(hardware_key(default_hw, sw));
	}
	if let Some(hw) = hw {
		hardware.push(hardware_key(hw, default_sw));
	}
	base.push(base_key(default_sw));
	hardware.push(hardware_key(default_hw, default_sw));
	if let Some(fw) = fw {
		firmware.push(firmware_key(fw));
	}
	firmware.push(firmware_key(&config.default_firmware_base));

	for keys in [&mut base, &mut hardware, &mut firmware] {
		let mut seen = std::collections::HashSet::new();
		keys.retain(|key| seen.insert(key.clone()));
	}

	vec![(LayerId::Base, base), (LayerId::HardwareBase, hardware), (LayerId::FirmwareBase, firmware)]
}

// vim: ts=4
