// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use foundry_common_secret::SecretString;
use keyring::credential::{CredentialBuilderApi, CredentialPersistence};

use crate::error::TokenStoreError;
use crate::vault::{TokenVault, ACCOUNT_NAME, SERVICE_NAME};

/// Token slot in the OS keychain (Secret Service behind a keyutils cache on
/// Linux, macOS Keychain, Windows Credential Manager).
#[derive(Debug, Clone)]
pub struct KeyringVault {
	service: String,
	account: String,
	durable: bool,
}

impl KeyringVault {
	pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
		Self {
			service: service.into(),
			account: account.into(),
			durable: backend_is_durable(),
		}
	}

	fn entry(service: &str, account: &str) -> Result<keyring::Entry, TokenStoreError> {
		keyring::Entry::new(service, account)
			.map_err(|e| TokenStoreError::unavailable(e.to_string()))
	}
}

/// Only on-disk keystores survive a reboot; keyutils and the mock store do not.
fn backend_is_durable() -> bool {
	matches!(
		keyring::default::default_credential_builder().persistence(),
		CredentialPersistence::UntilDelete
	)
}

impl Default for KeyringVault {
	fn default() -> Self {
		Self::new(SERVICE_NAME, ACCOUNT_NAME)
	}
}

#[async_trait]
impl TokenVault for KeyringVault {
	fn is_durable(&self) -> bool {
		self.durable
	}

	async fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
		let service = self.service.clone();
		let account = self.account.clone();

		tokio::task::spawn_blocking(move || {
			let entry = Self::entry(&service, &account)?;
			match entry.get_password() {
				Ok(token) => Ok(Some(SecretString::new(token))),
				Err(keyring::Error::NoEntry) => Ok(None),
				Err(e) => Err(TokenStoreError::unavailable(e.to_string())),
			}
		})
		.await
		.map_err(|e| TokenStoreError::unavailable(e.to_string()))?
	}

	async fn store(&self, token: &SecretString) -> Result<(), TokenStoreError> {
		let service = self.service.clone();
		let account = self.account.clone();
		let token = token.clone();

		tokio::task::spawn_blocking(move || {
			Self::entry(&service, &account)?
				.set_password(token.expose())
				.map_err(|e| TokenStoreError::unavailable(e.to_string()))?;

			// Read back through a fresh entry to catch mock backends that only
			// keep values per entry instance.
			match Self::entry(&service, &account)?.get_password() {
				Ok(stored) if stored == *token.expose() => Ok(()),
				Ok(_) => Err(TokenStoreError::unavailable(
					"keyring verification failed: stored value mismatch",
				)),
				Err(keyring::Error::NoEntry) => Err(TokenStoreError::unavailable(
					"keyring verification failed: token not persisted",
				)),
				Err(e) => Err(TokenStoreError::unavailable(format!(
					"keyring verification failed: {e}"
				))),
			}
		})
		.await
		.map_err(|e| TokenStoreError::unavailable(e.to_string()))?
	}

	async fn delete(&self) -> Result<(), TokenStoreError> {
		let service = self.service.clone();
		let account = self.account.clone();

		tokio::task::spawn_blocking(move || {
			match Self::entry(&service, &account)?.delete_credential() {
				Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
				Err(e) => Err(TokenStoreError::unavailable(e.to_string())),
			}
		})
		.await
		.map_err(|e| TokenStoreError::unavailable(e.to_string()))?
	}
}
