// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Vault-then-file storage for the operator auth token.

use std::path::PathBuf;
use std::sync::Arc;

use foundry_common_secret::SecretString;
use tracing::{debug, warn};

use crate::error::TokenStoreError;
use crate::file::TokenFile;
use crate::vault::TokenVault;

/// The single, non-instance-scoped slot holding the token used to
/// authenticate against the remote KV store.
///
/// Concurrent `store`/`clear` calls from separate processes are not
/// coordinated; the last writer wins.
#[derive(Debug, Clone)]
pub struct AuthTokenStore {
	vault: Arc<dyn TokenVault>,
	file: TokenFile,
}

impl AuthTokenStore {
	/// Store backed by the OS keychain and `<config-dir>/foundry/auth-token`.
	pub fn new() -> Result<Self, TokenStoreError> {
		Ok(Self::with_backends(
			default_vault(),
			crate::paths::token_file_path()?,
		))
	}

	pub fn with_backends(vault: Arc<dyn TokenVault>, file_path: impl Into<PathBuf>) -> Self {
		Self {
			vault,
			file: TokenFile::new(file_path),
		}
	}

	pub fn file_path(&self) -> &std::path::Path {
		self.file.path()
	}

	/// Save `token`, replacing any previous one.
	///
	/// A vault that forgets on reboot gets the fallback file written too, so
	/// the token is always on durable storage.
	pub async fn store(&self, token: &SecretString) -> Result<(), TokenStoreError> {
		if token.is_blank() {
			return Err(TokenStoreError::InvalidToken);
		}

		match self.vault.store(token).await {
			Ok(()) if self.vault.is_durable() => {
				debug!("auth token stored in vault");
				// A stale fallback copy would resurface if the vault later
				// became unreachable.
				if let Err(e) = self.file.delete().await {
					warn!(
						error = %e,
						path = %self.file.path().display(),
						"failed to remove stale fallback token file"
					);
				}
				return Ok(());
			}
			Ok(()) => {
				debug!("auth token stored in volatile vault, mirroring to token file");
			}
			Err(e) => {
				warn!(error = %e, "vault store failed, falling back to token file");
			}
		}

		self.file.write(token).await
	}

	/// Load the token from the vault, then the fallback file.
	pub async fn load(&self) -> Result<SecretString, TokenStoreError> {
		match self.vault.load().await {
			Ok(Some(token)) => {
				debug!("loaded auth token from vault");
				return Ok(token);
			}
			Ok(None) => debug!("vault holds no auth token, trying fallback file"),
			Err(e) => warn!(error = %e, "vault load failed, trying fallback file"),
		}

		match self.file.read().await {
			Ok(Some(token)) => {
				debug!(path = %self.file.path().display(), "loaded auth token from fallback file");
				Ok(token)
			}
			Ok(None) => Err(TokenStoreError::NotFound),
			Err(e) => {
				warn!(error = %e, "fallback token file unreadable");
				Err(TokenStoreError::NotFound)
			}
		}
	}

	/// Remove the token from both locations.
	///
	/// Fails only when both deletions fail.
	pub async fn clear(&self) -> Result<(), TokenStoreError> {
		let vault_result = self.vault.delete().await;
		let file_result = self.file.delete().await;

		match (vault_result, file_result) {
			(Err(vault), Err(file)) => Err(TokenStoreError::ClearFailed {
				vault: vault.to_string(),
				file: file.to_string(),
			}),
			(Err(e), Ok(())) | (Ok(()), Err(e)) => {
				warn!(error = %e, "partial failure clearing auth token");
				Ok(())
			}
			(Ok(()), Ok(())) => Ok(()),
		}
	}
}

#[cfg(feature = "keyring")]
fn default_vault() -> Arc<dyn TokenVault> {
	Arc::new(crate::vault_keyring::KeyringVault::default())
}

#[cfg(not(feature = "keyring"))]
fn default_vault() -> Arc<dyn TokenVault> {
	Arc::new(crate::vault::UnavailableVault::new(
		"built without OS keyring support",
	))
}
