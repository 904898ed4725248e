pub use netcfg_types::prelude::*;

pub use tracing::{debug, debug_span, error, info, info_span, warn};

// vim: ts=4
