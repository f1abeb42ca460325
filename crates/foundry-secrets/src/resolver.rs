// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use foundry_common_secret::SecretString;

use crate::context::ResolutionContext;
use crate::error::ResolveError;
use crate::reference::SecretReference;

/// A backing store that can answer "what is the value of this reference in
/// this instance?".
///
/// Implementations hold only construction-time state and must not mutate
/// anything per call, so a resolver can be shared across tasks.
#[async_trait]
pub trait Resolver: Send + Sync + std::fmt::Debug {
	/// Short label used in chain diagnostics (e.g. `env`).
	fn name(&self) -> &str;

	async fn resolve(
		&self,
		ctx: &ResolutionContext,
		reference: &SecretReference,
	) -> Result<SecretString, ResolveError>;
}
