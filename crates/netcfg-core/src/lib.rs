//! Core of the netcfg configuration engine.
//!
//! Resolves the effective value of every configuration field from an ordered
//! stack of layers, keeps uncommitted edits per scope unit, diffs them for
//! review, and validates and submits them through a [`LayerAdapter`].
//!
//! [`LayerAdapter`]: netcfg_types::layer_adapter::LayerAdapter

#![forbid(unsafe_code)]

pub mod commit;
pub mod diff;
pub mod draft;
pub mod editor;
pub mod layer_stack;
#[cfg(any(test, feature = "test-util"))]
pub mod memory_adapter;
pub mod prelude;
pub mod resolve;
pub mod review;
pub mod settings;

pub use commit::{CommitCoordinator, CommitError, CommitSummary, CommitTicket};
pub use draft::{DraftManager, DraftValue};
pub use editor::{ConfigEditor, InputData};
pub use layer_stack::LayerStack;
pub use resolve::{DisplayValue, Resolution};

// vim: ts=4
