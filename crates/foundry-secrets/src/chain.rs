// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Ordered, first-success-wins composition of resolvers.

use std::sync::Arc;

use async_trait::async_trait;
use foundry_common_secret::SecretString;
use tracing::{debug, warn};

use crate::context::ResolutionContext;
use crate::error::{ResolveError, ResolverFailure};
use crate::reference::SecretReference;
use crate::resolver::Resolver;

/// Tries each resolver in construction order and returns the first value.
///
/// No retries and no caching: resolving the same reference twice runs the
/// whole chain twice.
#[derive(Debug, Clone, Default)]
pub struct ChainResolver {
	resolvers: Vec<Arc<dyn Resolver>>,
}

impl ChainResolver {
	pub fn new(resolvers: Vec<Arc<dyn Resolver>>) -> Self {
		Self { resolvers }
	}

	pub fn len(&self) -> usize {
		self.resolvers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.resolvers.is_empty()
	}

	/// Resolver names in chain order.
	pub fn names(&self) -> Vec<&str> {
		self.resolvers.iter().map(|r| r.name()).collect()
	}
}

#[async_trait]
impl Resolver for ChainResolver {
	fn name(&self) -> &str {
		"chain"
	}

	async fn resolve(
		&self,
		ctx: &ResolutionContext,
		reference: &SecretReference,
	) -> Result<SecretString, ResolveError> {
		if self.resolvers.is_empty() {
			return Err(ResolveError::NoResolversConfigured);
		}

		let mut failures = Vec::with_capacity(self.resolvers.len());
		for (index, resolver) in self.resolvers.iter().enumerate() {
			match resolver.resolve(ctx, reference).await {
				Ok(value) => {
					debug!(
						resolver = resolver.name(),
						position = index + 1,
						instance = ctx.instance(),
						namespace = ctx.namespace().unwrap_or_default(),
						reference = %reference,
						"secret resolved"
					);
					return Ok(value);
				}
				Err(e) => {
					debug!(
						resolver = resolver.name(),
						position = index + 1,
						error = %e,
						"resolver failed, trying next"
					);
					failures.push(ResolverFailure {
						position: index + 1,
						resolver: resolver.name().to_string(),
						message: e.to_string(),
					});
				}
			}
		}

		let full_key = ctx.full_key(reference);
		warn!(full_key = %full_key, attempts = failures.len(), "all secret resolvers failed");
		Err(ResolveError::ChainExhausted { full_key, failures })
	}
}
