// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Primary storage slot for the auth token.

use async_trait::async_trait;
use foundry_common_secret::SecretString;

use crate::error::TokenStoreError;

/// Keychain service name for the Foundry auth token.
pub const SERVICE_NAME: &str = "foundry-cli";

/// Keychain account name for the Foundry auth token.
pub const ACCOUNT_NAME: &str = "auth-token";

/// A single secured slot holding the operator token.
///
/// The OS keychain is process-wide state, so it sits behind this trait and
/// tests swap in [`MemoryVault`] or [`UnavailableVault`].
#[async_trait]
pub trait TokenVault: Send + Sync + std::fmt::Debug {
	/// Read the token. `Ok(None)` means the slot is empty.
	async fn load(&self) -> Result<Option<SecretString>, TokenStoreError>;

	/// Write the token, replacing any previous value.
	async fn store(&self, token: &SecretString) -> Result<(), TokenStoreError>;

	/// Remove the token. Deleting an empty slot succeeds.
	async fn delete(&self) -> Result<(), TokenStoreError>;

	/// Whether a stored token outlives a reboot. Volatile vaults get the
	/// fallback file written alongside them.
	fn is_durable(&self) -> bool {
		true
	}
}

/// In-memory vault for tests.
///
/// [`MemoryVault::new`] stands in for a disk-backed keychain;
/// [`MemoryVault::volatile`] for a kernel keyring that forgets on reboot.
#[derive(Debug)]
pub struct MemoryVault {
	token: tokio::sync::RwLock<Option<SecretString>>,
	durable: bool,
}

impl MemoryVault {
	pub fn new() -> Self {
		Self {
			token: tokio::sync::RwLock::new(None),
			durable: true,
		}
	}

	pub fn volatile() -> Self {
		Self {
			durable: false,
			..Self::new()
		}
	}
}

impl Default for MemoryVault {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl TokenVault for MemoryVault {
	fn is_durable(&self) -> bool {
		self.durable
	}

	async fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
		Ok(self.token.read().await.clone())
	}

	async fn store(&self, token: &SecretString) -> Result<(), TokenStoreError> {
		*self.token.write().await = Some(token.clone());
		Ok(())
	}

	async fn delete(&self) -> Result<(), TokenStoreError> {
		self.token.write().await.take();
		Ok(())
	}
}

/// A vault that always fails, used when no OS keychain is compiled in or
/// reachable. Every call reports [`TokenStoreError::Unavailable`].
#[derive(Debug, Clone)]
pub struct UnavailableVault {
	reason: String,
}

impl UnavailableVault {
	pub fn new(reason: impl Into<String>) -> Self {
		Self {
			reason: reason.into(),
		}
	}
}

#[async_trait]
impl TokenVault for UnavailableVault {
	async fn load(&self) -> Result<Option<SecretString>, TokenStoreError> {
		Err(TokenStoreError::unavailable(self.reason.clone()))
	}

	async fn store(&self, _token: &SecretString) -> Result<(), TokenStoreError> {
		Err(TokenStoreError::unavailable(self.reason.clone()))
	}

	async fn delete(&self) -> Result<(), TokenStoreError> {
		Err(TokenStoreError::unavailable(self.reason.clone()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn memory_vault_overwrites_and_deletes() {
		let vault = MemoryVault::new();
		assert!(vault.load().await.unwrap().is_none());

		vault.store(&"t1".into()).await.unwrap();
		vault.store(&"t2".into()).await.unwrap();
		assert_eq!(vault.load().await.unwrap().unwrap().expose(), "t2");

		vault.delete().await.unwrap();
		vault.delete().await.unwrap();
		assert!(vault.load().await.unwrap().is_none());
	}

	#[test]
	fn durability_is_reported() {
		assert!(MemoryVault::new().is_durable());
		assert!(!MemoryVault::volatile().is_durable());
	}

	#[tokio::test]
	async fn unavailable_vault_reports_reason() {
		let vault = UnavailableVault::new("no keychain");
		let err = vault.load().await.unwrap_err();
		assert!(matches!(err, TokenStoreError::Unavailable(ref m) if m == "no keychain"));
		assert!(vault.store(&"t".into()).await.is_err());
		assert!(vault.delete().await.is_err());
	}
}
