//! netcfg is a layered network configuration engine.
//!
//! # Features
//!
//! - Fixed-precedence layers: base, hardware base, firmware base, auto-generated
//!   node overrides, network overrides, node overrides
//! - Effective value resolution with provenance
//! - Draft editing with edit/revert and their undo
//! - Review of pending changes, with secret masking and restart warnings
//! - Atomic validation and submission through a pluggable layer adapter

#![forbid(unsafe_code)]

// Re-export shared types and the adapter trait from netcfg-types
pub use netcfg_types::error;
pub use netcfg_types::layer_adapter;
pub use netcfg_types::tree;
pub use netcfg_types::types;

// Engine re-exports
pub use netcfg_core::commit;
pub use netcfg_core::diff;
pub use netcfg_core::draft;
pub use netcfg_core::editor;
pub use netcfg_core::layer_stack;
#[cfg(feature = "test-util")]
pub use netcfg_core::memory_adapter;
pub use netcfg_core::resolve;
pub use netcfg_core::review;
pub use netcfg_core::settings;

// Local modules
pub mod app;
pub mod prelude;

pub use app::{Engine, EngineBuilder, VERSION};

// vim: ts=4
