// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolver chain configuration.
//!
//! ```toml
//! chain = ["env", "override_file", "remote_kv"]
//! override_file = "/home/me/.config/foundry/secrets.override"
//!
//! [remote_kv]
//! address = "https://vault.example.com:8200"
//! mount = "secret"
//! path_template = "/v1/{mount}/data/{path}"
//! token_header = "X-Vault-Token"
//! timeout_secs = 30
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default KV v2 mount point.
pub const DEFAULT_MOUNT: &str = "secret";

/// Default KV v2 read endpoint; `{mount}` and `{path}` are substituted.
pub const DEFAULT_PATH_TEMPLATE: &str = "/v1/{mount}/data/{path}";

/// Default header carrying the auth token.
pub const DEFAULT_TOKEN_HEADER: &str = "X-Vault-Token";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// File name of the default override file inside the config directory.
pub const OVERRIDE_FILE_NAME: &str = "secrets.override";

/// A backend that can appear in the resolver chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
	Env,
	OverrideFile,
	RemoteKv,
}

impl BackendKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			BackendKind::Env => "env",
			BackendKind::OverrideFile => "override_file",
			BackendKind::RemoteKv => "remote_kv",
		}
	}
}

/// Connection settings for the KV v2 store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteKvConfig {
	pub address: String,
	pub mount: String,
	pub path_template: String,
	pub token_header: String,
	pub timeout_secs: u64,
	/// Permit `http://` addresses (local dev servers only).
	pub allow_insecure: bool,
}

impl Default for RemoteKvConfig {
	fn default() -> Self {
		Self {
			address: String::new(),
			mount: DEFAULT_MOUNT.to_string(),
			path_template: DEFAULT_PATH_TEMPLATE.to_string(),
			token_header: DEFAULT_TOKEN_HEADER.to_string(),
			timeout_secs: DEFAULT_TIMEOUT_SECS,
			allow_insecure: false,
		}
	}
}

impl RemoteKvConfig {
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.address.trim().is_empty() {
			return Err(ConfigError::missing_field("remote_kv.address"));
		}
		let is_https = self.address.starts_with("https://");
		let is_http = self.address.starts_with("http://");
		if !is_https && !is_http {
			return Err(ConfigError::invalid_value(
				"remote_kv.address",
				format!("'{}' is not an http(s) URL", self.address),
			));
		}
		if is_http && !self.allow_insecure {
			return Err(ConfigError::invalid_value(
				"remote_kv.address",
				"must use HTTPS (set allow_insecure = true for a local dev server)",
			));
		}
		if !self.path_template.contains("{path}") {
			return Err(ConfigError::invalid_value(
				"remote_kv.path_template",
				"must contain the {path} placeholder",
			));
		}
		if self.token_header.trim().is_empty() {
			return Err(ConfigError::missing_field("remote_kv.token_header"));
		}
		if self.timeout_secs == 0 {
			return Err(ConfigError::invalid_value(
				"remote_kv.timeout_secs",
				"must be greater than zero",
			));
		}
		Ok(())
	}
}

/// Which backends to try, in order, and how to reach them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
	pub chain: Vec<BackendKind>,
	/// Override file location; defaults to `<config-dir>/foundry/secrets.override`.
	pub override_file: Option<PathBuf>,
	pub remote_kv: Option<RemoteKvConfig>,
}

impl Default for SecretsConfig {
	fn default() -> Self {
		Self {
			chain: vec![BackendKind::Env, BackendKind::OverrideFile],
			override_file: None,
			remote_kv: None,
		}
	}
}

impl SecretsConfig {
	/// Parse and validate TOML text; `origin` labels parse errors.
	pub fn from_toml_str(contents: &str, origin: impl Into<PathBuf>) -> Result<Self, ConfigError> {
		let config: SecretsConfig =
			toml::from_str(contents).map_err(|source| ConfigError::TomlParse {
				path: origin.into(),
				source,
			})?;
		config.validate()?;
		Ok(config)
	}

	/// Load from `path`; a missing file yields the defaults.
	pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		match tokio::fs::read_to_string(path).await {
			Ok(contents) => Self::from_toml_str(&contents, path),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				tracing::debug!(path = %path.display(), "no secrets config file, using defaults");
				Ok(Self::default())
			}
			Err(source) => Err(ConfigError::Io {
				path: path.to_path_buf(),
				source,
			}),
		}
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		let mut seen = HashSet::new();
		for kind in &self.chain {
			if !seen.insert(kind) {
				return Err(ConfigError::invalid_value(
					"chain",
					format!("'{}' listed more than once", kind.as_str()),
				));
			}
		}

		match (&self.remote_kv, self.chain.contains(&BackendKind::RemoteKv)) {
			(None, true) => Err(ConfigError::missing_field("remote_kv")),
			(Some(remote), _) => remote.validate(),
			(None, false) => Ok(()),
		}
	}

	/// Configured override file, or the default under the config directory.
	pub fn override_file_path(&self) -> Result<PathBuf, ConfigError> {
		if let Some(path) = &self.override_file {
			return Ok(path.clone());
		}
		foundry_cli_credentials::paths::config_dir()
			.map(|dir| dir.join(OVERRIDE_FILE_NAME))
			.map_err(|e| ConfigError::invalid_value("override_file", e.to_string()))
	}
}
