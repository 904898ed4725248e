use netcfg_types::error::Error as NetcfgError;
use std::fmt;

/// Internal error type for the redb layer store
#[derive(Debug)]
pub enum Error {
	RedbError(String),
	JsonError(String),
	IoError(std::io::Error),
	InvalidKey(String),
	Unknown(String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::RedbError(msg) => write!(f, "redb error: {}", msg),
			Error::JsonError(msg) => write!(f, "json error: {}", msg),
			Error::IoError(e) => write!(f, "io error: {}", e),
			Error::InvalidKey(msg) => write!(f, "invalid key: {}", msg),
			Error::Unknown(msg) => write!(f, "unknown error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(e: std::io::Error) -> Self {
		Error::IoError(e)
	}
}

impl From<serde_json::Error> for Error {
	fn from(e: serde_json::Error) -> Self {
		Error::JsonError(e.to_string())
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(e: tokio::task::JoinError) -> Self {
		Error::Unknown(e.to_string())
	}
}

impl From<Error> for NetcfgError {
	fn from(e: Error) -> Self {
		// Stored documents that do not parse are corrupt layers, everything
		// else is a storage failure
		match e {
			Error::IoError(io_err) => NetcfgError::Io(io_err),
			Error::JsonError(msg) => NetcfgError::CorruptLayer(msg),
			Error::InvalidKey(msg) => NetcfgError::ConfigError(msg),
			Error::RedbError(msg) | Error::Unknown(msg) => {
				tracing::warn!("layer store failure: {}", msg);
				NetcfgError::DbError
			}
		}
	}
}

/// Helper to convert redb errors
pub fn from_redb_error<E: fmt::Display>(err: E) -> Error {
	Error::RedbError(err.to_string())
}

// vim: ts=4
