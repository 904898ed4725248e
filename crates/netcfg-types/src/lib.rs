//! Shared types, adapter traits, and core utilities for the netcfg engine.
//!
//! This crate contains the foundational types that are shared between the
//! engine and all layer adapter implementations. Keeping them separate lets
//! adapter crates compile without pulling in the engine itself.

#![forbid(unsafe_code)]

pub mod error;
pub mod layer_adapter;
pub mod prelude;
pub mod tree;
pub mod types;

// vim: ts=4
