//! Value validation for setting definitions
//!
//! Validators operate on the raw textual value of a field, the way it is
//! typed into an input. Blank values never reach them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::prelude::*;

/// Setting data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
	String,
	Int,
	Bool,
	SecretString,
	/// Comma separated list of strings
	StringArray,
}

impl DataType {
	/// Check that a non-blank raw value is well-formed for this type
	pub fn check(self, raw: &str) -> Result<(), String> {
		match self {
			DataType::String | DataType::SecretString => Ok(()),
			DataType::Int => raw
				.trim()
				.parse::<i64>()
				.map(|_| ())
				.map_err(|_| format!("'{}' is not an integer", raw)),
			DataType::Bool => match raw.trim() {
				"true" | "false" => Ok(()),
				_ => Err(format!("'{}' is not a boolean (true/false)", raw)),
			},
			DataType::StringArray => {
				if raw.split(',').any(|item| item.trim().is_empty()) {
					Err("list contains an empty item".into())
				} else {
					Ok(())
				}
			}
		}
	}

	/// Turn raw input into a scalar. Values that do not parse stay strings so
	/// that validation can report them.
	pub fn parse_raw(self, raw: &str) -> Scalar {
		match self {
			DataType::Int => match raw.trim().parse::<i64>() {
				Ok(i) => Scalar::Int(i),
				Err(_) => Scalar::from(raw),
			},
			DataType::Bool => match raw.trim() {
				"true" => Scalar::Bool(true),
				"false" => Scalar::Bool(false),
				_ => Scalar::from(raw),
			},
			DataType::String | DataType::SecretString | DataType::StringArray => {
				Scalar::from(raw)
			}
		}
	}

	pub fn is_secret(self) -> bool {
		self == DataType::SecretString
	}
}

/// Named validators that can be attached to a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidatorId {
	Integer,
	Number,
	Boolean,
	Port,
	Url,
	IpAddr,
}

impl ValidatorId {
	pub fn check(self, raw: &str) -> Result<(), String> {
		let value = raw.trim();
		match self {
			ValidatorId::Integer => DataType::Int.check(value),
			ValidatorId::Number => value
				.parse::<f64>()
				.ok()
				.filter(|n| n.is_finite())
				.map(|_| ())
				.ok_or_else(|| format!("'{}' is not a number", value)),
			ValidatorId::Boolean => DataType::Bool.check(value),
			ValidatorId::Port => match value.parse::<u16>() {
				Ok(port) if port > 0 => Ok(()),
				_ => Err(format!("'{}' is not a valid port", value)),
			},
			ValidatorId::Url => url::Url::parse(value)
				.map(|_| ())
				.map_err(|err| format!("'{}' is not a valid URL: {}", value, err)),
			ValidatorId::IpAddr => value
				.parse::<IpAddr>()
				.map(|_| ())
				.map_err(|_| format!("'{}' is not a valid IP address", value)),
		}
	}
}

/// A field-level validation failure
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
	/// Scope of the draft the value came from, when known
	pub scope: Option<Scope>,
	pub path: Path,
	pub reason: String,
}

impl ValidationError {
	pub fn new(path: Path, reason: impl Into<String>) -> Self {
		Self { scope: None, path, reason: reason.into() }
	}

	pub fn in_scope(mut self, scope: Scope) -> Self {
		self.scope = Some(scope);
		self
	}
}

impl fmt::Display for ValidationError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.scope {
			Some(scope) => write!(f, "{} ({}): {}", self.path, scope, self.reason),
			None => write!(f, "{}: {}", self.path, self.reason),
		}
	}
}

impl std::error::Error for ValidationError {}


// vim: ts=4
