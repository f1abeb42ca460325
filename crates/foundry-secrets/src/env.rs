// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Resolve references from `FOUNDRY_SECRET_*` environment variables.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use foundry_common_secret::SecretString;
use tracing::debug;

use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::reference::SecretReference;
use crate::resolver::Resolver;

/// Read access to environment variables.
///
/// The process environment is global state; tests pass a map instead.
pub trait EnvSource: Send + Sync + std::fmt::Debug {
	fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
	fn var(&self, name: &str) -> Option<String> {
		std::env::var(name).ok()
	}
}

impl EnvSource for HashMap<String, String> {
	fn var(&self, name: &str) -> Option<String> {
		self.get(name).cloned()
	}
}

#[derive(Debug, Clone)]
pub struct EnvResolver {
	source: Arc<dyn EnvSource>,
}

impl EnvResolver {
	/// Resolver over the process environment.
	pub fn new() -> Self {
		Self::with_source(Arc::new(ProcessEnv))
	}

	pub fn with_source(source: Arc<dyn EnvSource>) -> Self {
		Self { source }
	}
}

impl Default for EnvResolver {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Resolver for EnvResolver {
	fn name(&self) -> &str {
		"env"
	}

	async fn resolve(
		&self,
		ctx: &ResolutionContext,
		reference: &SecretReference,
	) -> Result<SecretString, ResolveError> {
		let name = ctx.env_var_name(reference);
		match self.source.var(&name) {
			Some(value) if !value.is_empty() => {
				debug!(var = %name, "resolved secret from environment");
				Ok(SecretString::new(value))
			}
			_ => Err(ResolveError::not_found(format!(
				"environment variable {name} not set"
			))),
		}
	}
}
