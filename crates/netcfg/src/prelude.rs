pub use netcfg_core::prelude::*;

pub use netcfg_core::{CommitError, ConfigEditor, DisplayValue, DraftValue, InputData};

// vim: ts=4
