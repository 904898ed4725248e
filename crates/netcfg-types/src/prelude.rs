pub use crate::error::{Error, NcResult};
pub use crate::tree::{ConfigNode, ConfigTree, Path, Scalar};
pub use crate::types::{Layer, LayerId, NodeId, Scope};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
