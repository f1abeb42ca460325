// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for secret reference parsing and resolution.

use std::fmt;
use std::path::PathBuf;

use foundry_cli_credentials::TokenStoreError;
use thiserror::Error;

/// The input looks like `${secret:...}` but breaks the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
	#[error("malformed secret reference '{input}': {reason}")]
	Malformed { input: String, reason: String },
}

impl ReferenceError {
	pub(crate) fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::Malformed {
			input: input.into(),
			reason: reason.into(),
		}
	}
}

/// One failed attempt inside a [`ChainResolver`](crate::ChainResolver) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverFailure {
	/// 1-based position in the chain.
	pub position: usize,
	pub resolver: String,
	pub message: String,
}

impl fmt::Display for ResolverFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"resolver {} ({}): {}",
			self.position, self.resolver, self.message
		)
	}
}

/// Failure to produce a value for a reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
	/// The backend has no value for this reference. The next resolver in a
	/// chain may still have one.
	#[error("{0}")]
	NotFound(String),

	/// Transport, auth or type failure talking to a backend.
	#[error("{0}")]
	Unavailable(String),

	/// The chain was built without any resolvers.
	#[error("no resolvers configured")]
	NoResolversConfigured,

	/// Every resolver in the chain failed.
	#[error("{}", format_exhausted(.full_key, .failures))]
	ChainExhausted {
		full_key: String,
		failures: Vec<ResolverFailure>,
	},
}

impl ResolveError {
	pub fn not_found(msg: impl Into<String>) -> Self {
		Self::NotFound(msg.into())
	}

	pub fn unavailable(msg: impl Into<String>) -> Self {
		Self::Unavailable(msg.into())
	}

	/// True for soft misses that a chain should skip past.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_))
	}
}

fn format_exhausted(full_key: &str, failures: &[ResolverFailure]) -> String {
	let details = failures
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("; ");
	format!(
		"failed to resolve secret '{full_key}' after trying {} resolver(s): {details}",
		failures.len()
	)
}

/// Hard construction-time faults in an override file.
#[derive(Debug, Error)]
pub enum OverrideFileError {
	#[error("failed to read override file {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("{path}:{line}: expected '<key>=<value>'")]
	MissingSeparator { path: PathBuf, line: usize },

	#[error("{path}:{line}: empty key")]
	EmptyKey { path: PathBuf, line: usize },
}

/// Errors loading or validating secrets configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	#[error("Missing required field: {0}")]
	MissingField(String),
}

impl ConfigError {
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}

	pub fn missing_field(field: impl Into<String>) -> Self {
		Self::MissingField(field.into())
	}
}

/// Umbrella error for callers that parse, build and resolve in one go.
#[derive(Debug, Error)]
pub enum SecretsError {
	#[error(transparent)]
	Reference(#[from] ReferenceError),

	#[error(transparent)]
	Resolve(#[from] ResolveError),

	#[error(transparent)]
	OverrideFile(#[from] OverrideFileError),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Token(#[from] TokenStoreError),
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exhausted_message_lists_failures_in_order() {
		let err = ResolveError::ChainExhausted {
			full_key: "myapp-prod/database/prod:password".to_string(),
			failures: vec![
				ResolverFailure {
					position: 1,
					resolver: "env".to_string(),
					message: "environment variable X not set".to_string(),
				},
				ResolverFailure {
					position: 2,
					resolver: "override-file".to_string(),
					message: "not in file".to_string(),
				},
			],
		};

		assert_eq!(
			err.to_string(),
			"failed to resolve secret 'myapp-prod/database/prod:password' \
			 after trying 2 resolver(s): \
			 resolver 1 (env): environment variable X not set; \
			 resolver 2 (override-file): not in file"
		);
	}

	#[test]
	fn override_file_errors_carry_line_numbers() {
		let err = OverrideFileError::MissingSeparator {
			path: PathBuf::from("secrets.override"),
			line: 7,
		};
		assert_eq!(err.to_string(), "secrets.override:7: expected '<key>=<value>'");
	}
}
