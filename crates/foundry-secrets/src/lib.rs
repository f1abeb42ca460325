// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Instance-scoped resolution of `${secret:<path>:<key>}` references.
//!
//! A config template names secrets by path and key. At deploy time a
//! [`ResolutionContext`] scopes every lookup to one instance, and a
//! [`ChainResolver`] asks each backend in turn:
//!
//! 1. [`EnvResolver`]: `FOUNDRY_SECRET_<INSTANCE>_<PATH>_<KEY>`
//! 2. [`OverrideFileResolver`]: `<instance>/<path>:<key>=<value>` lines
//! 3. [`RemoteKvResolver`]: a Vault-style KV v2 engine
//!
//! The first value found wins. If every backend misses, the error lists each
//! backend's reason in order.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use foundry_secrets::{
//!     ChainResolver, EnvResolver, OverrideFileResolver, ResolutionContext, Resolver,
//!     SecretReference,
//! };
//!
//! # tokio_test::block_on(async {
//! let chain = ChainResolver::new(vec![
//!     Arc::new(EnvResolver::new()) as Arc<dyn Resolver>,
//!     Arc::new(OverrideFileResolver::load("secrets.override").await?),
//! ]);
//!
//! let ctx = ResolutionContext::new("myapp-prod");
//! let reference = SecretReference::parse("${secret:database/prod:password}")?
//!     .expect("is a reference");
//! let password = chain.resolve(&ctx, &reference).await?;
//! println!("resolved {reference}: {password}"); // value prints as [REDACTED]
//! # Ok::<(), foundry_secrets::SecretsError>(())
//! # });
//! ```

mod builder;
mod chain;
pub mod config;
mod context;
mod env;
mod error;
mod expand;
mod override_file;
mod reference;
mod remote_kv;
mod resolver;

pub use builder::{build_chain, ChainBuilder, TOKEN_ENV_VAR, TOKEN_FILE_ENV_VAR};
pub use chain::ChainResolver;
pub use config::{BackendKind, RemoteKvConfig, SecretsConfig};
pub use context::{ResolutionContext, ENV_VAR_PREFIX};
pub use env::{EnvResolver, EnvSource, ProcessEnv};
pub use error::{
	ConfigError, OverrideFileError, ReferenceError, ResolveError, ResolverFailure, SecretsError,
};
pub use expand::resolve_value;
pub use foundry_common_secret::SecretString;
pub use override_file::OverrideFileResolver;
pub use reference::{is_reference, SecretReference, REFERENCE_PREFIX, REFERENCE_SUFFIX};
pub use remote_kv::RemoteKvResolver;
pub use resolver::Resolver;
