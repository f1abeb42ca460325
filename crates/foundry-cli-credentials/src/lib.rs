// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Storage for the Foundry operator auth token.
//!
//! The token authenticates the remote KV secret resolver. It lives in one
//! fixed slot that is not scoped by deployment instance:
//!
//! - **Primary**: the OS keychain, service `foundry-cli`, account `auth-token`
//!   (feature `keyring`, enabled by default)
//! - **Fallback**: `<config-dir>/foundry/auth-token`, mode 0600 in a 0700
//!   directory, used whenever the keychain call fails
//!
//! # Example
//!
//! ```rust,no_run
//! use foundry_cli_credentials::{AuthTokenStore, TokenStoreError};
//! use foundry_common_secret::SecretString;
//!
//! # tokio_test::block_on(async {
//! let store = AuthTokenStore::new()?;
//! store.store(&SecretString::from("hvs.example")).await?;
//!
//! match store.load().await {
//!     Ok(token) => println!("token: {token}"), // prints [REDACTED]
//!     Err(TokenStoreError::NotFound) => println!("please log in"),
//!     Err(e) => return Err(e),
//! }
//! # Ok::<(), TokenStoreError>(())
//! # });
//! ```

mod error;
mod file;
pub mod paths;
mod store;
mod vault;
#[cfg(feature = "keyring")]
mod vault_keyring;

pub use error::TokenStoreError;
pub use file::TokenFile;
pub use store::AuthTokenStore;
pub use vault::{MemoryVault, TokenVault, UnavailableVault, ACCOUNT_NAME, SERVICE_NAME};
#[cfg(feature = "keyring")]
pub use vault_keyring::KeyringVault;
