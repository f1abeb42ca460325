// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Turn a [`SecretsConfig`] into a ready [`ChainResolver`].

use std::path::PathBuf;
use std::sync::Arc;

use foundry_cli_credentials::{AuthTokenStore, TokenStoreError};
use foundry_common_secret::SecretString;
use tracing::debug;

use crate::chain::ChainResolver;
use crate::config::{BackendKind, SecretsConfig};
use crate::env::{EnvResolver, EnvSource, ProcessEnv};
use crate::error::{ConfigError, SecretsError};
use crate::override_file::OverrideFileResolver;
use crate::remote_kv::RemoteKvResolver;
use crate::resolver::Resolver;

/// Environment variable holding the remote KV token directly.
pub const TOKEN_ENV_VAR: &str = "FOUNDRY_VAULT_TOKEN";

/// Environment variable naming a file that holds the remote KV token.
pub const TOKEN_FILE_ENV_VAR: &str = "FOUNDRY_VAULT_TOKEN_FILE";

/// Builds resolvers in the configured order.
///
/// Remote KV token precedence: [`token`](Self::token), then
/// `FOUNDRY_VAULT_TOKEN_FILE`, then `FOUNDRY_VAULT_TOKEN`, then the
/// [`AuthTokenStore`].
#[derive(Debug, Clone)]
pub struct ChainBuilder {
	config: SecretsConfig,
	env: Arc<dyn EnvSource>,
	token: Option<SecretString>,
	token_store: Option<AuthTokenStore>,
}

impl ChainBuilder {
	pub fn new(config: SecretsConfig) -> Self {
		Self {
			config,
			env: Arc::new(ProcessEnv),
			token: None,
			token_store: None,
		}
	}

	/// Environment used by the env resolver and for token variables.
	pub fn env_source(mut self, env: Arc<dyn EnvSource>) -> Self {
		self.env = env;
		self
	}

	/// Externally supplied token; wins over every other source.
	pub fn token(mut self, token: SecretString) -> Self {
		self.token = Some(token);
		self
	}

	pub fn token_store(mut self, store: AuthTokenStore) -> Self {
		self.token_store = Some(store);
		self
	}

	pub async fn build(&self) -> Result<ChainResolver, SecretsError> {
		self.config.validate()?;

		let mut resolvers: Vec<Arc<dyn Resolver>> = Vec::with_capacity(self.config.chain.len());
		for kind in &self.config.chain {
			let resolver: Arc<dyn Resolver> = match kind {
				BackendKind::Env => Arc::new(EnvResolver::with_source(self.env.clone())),
				BackendKind::OverrideFile => {
					let path = self.config.override_file_path()?;
					Arc::new(OverrideFileResolver::load(path).await?)
				}
				BackendKind::RemoteKv => {
					let remote = self
						.config
						.remote_kv
						.as_ref()
						.ok_or_else(|| ConfigError::missing_field("remote_kv"))?;
					let token = self.remote_token().await?;
					Arc::new(RemoteKvResolver::new(remote, token)?)
				}
			};
			resolvers.push(resolver);
		}

		let chain = ChainResolver::new(resolvers);
		debug!(resolvers = ?chain.names(), "built secret resolver chain");
		Ok(chain)
	}

	async fn remote_token(&self) -> Result<SecretString, SecretsError> {
		if let Some(token) = &self.token {
			return Ok(token.clone());
		}

		if let Some(path) = self.env.var(TOKEN_FILE_ENV_VAR) {
			if path.is_empty() {
				return Err(ConfigError::invalid_value(TOKEN_FILE_ENV_VAR, "path is empty").into());
			}
			let path = PathBuf::from(path);
			let contents = tokio::fs::read_to_string(&path)
				.await
				.map(SecretString::new)
				.map_err(|source| ConfigError::Io {
					path: path.clone(),
					source,
				})?;
			let token = contents.expose().trim_end_matches(['\r', '\n']);
			debug!(path = %path.display(), "using remote KV token from file");
			return Ok(SecretString::new(token.to_string()));
		}

		if let Some(token) = self.env.var(TOKEN_ENV_VAR).filter(|t| !t.is_empty()) {
			debug!("using remote KV token from environment");
			return Ok(SecretString::new(token));
		}

		match &self.token_store {
			Some(store) => Ok(store.load().await?),
			None => Err(TokenStoreError::NotFound.into()),
		}
	}
}

/// Build the chain for `config` with the process environment and the
/// default auth token store.
pub async fn build_chain(config: &SecretsConfig) -> Result<ChainResolver, SecretsError> {
	ChainBuilder::new(config.clone())
		.token_store(AuthTokenStore::new()?)
		.build()
		.await
}
