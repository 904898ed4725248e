//! Effective value resolution
//!
//! Given the value of every layer at one path (ascending precedence) and the
//! draft entry for that path, decide what is displayed and where it comes from.

use serde::Serialize;

use crate::draft::DraftValue;
use crate::prelude::*;

/// What an input shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum DisplayValue {
	Value(Scalar),
	/// Nothing defined anywhere. Distinct from an empty string.
	Unset,
}

impl DisplayValue {
	pub fn scalar(&self) -> Option<&Scalar> {
		match self {
			DisplayValue::Value(value) => Some(value),
			DisplayValue::Unset => None,
		}
	}

	pub fn is_unset(&self) -> bool {
		matches!(self, DisplayValue::Unset)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
	pub display_value: DisplayValue,
	/// Index into the layer list of the layer providing the value
	pub source_layer_index: Option<usize>,
	pub is_draft: bool,
	pub is_reverted: bool,
}

/// Highest layer defining a value, optionally skipping one index
fn highest_defined(layer_values: &[Option<&Scalar>], skip: Option<usize>) -> Option<(usize, Scalar)> {
	layer_values
		.iter()
		.enumerate()
		.rev()
		.filter(|(idx, _)| Some(*idx) != skip)
		.find_map(|(idx, value)| value.map(|value| (idx, value.clone())))
}

/// Resolve the display value at one path
pub fn resolve(
	layer_values: &[Option<&Scalar>],
	editable_index: usize,
	draft: Option<&DraftValue>,
) -> Resolution {
	let (found, is_draft, is_reverted) = match draft {
		Some(DraftValue::Set(value)) => (Some((editable_index, value.clone())), true, false),
		Some(DraftValue::Revert) => (highest_defined(layer_values, Some(editable_index)), false, true),
		None => (highest_defined(layer_values, None), false, false),
	};

	match found {
		Some((idx, value)) => Resolution {
			display_value: DisplayValue::Value(value),
			source_layer_index: Some(idx),
			is_draft,
			is_reverted,
		},
		None => Resolution {
			display_value: DisplayValue::Unset,
			source_layer_index: None,
			is_draft,
			is_reverted,
		},
	}
}

/// Value the path falls back to without the editable layer
pub fn fallback(layer_values: &[Option<&Scalar>], editable_index: usize) -> Option<(usize, Scalar)> {
	highest_defined(layer_values, Some(editable_index))
}


// vim: ts=4
