// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use foundry_common_secret::SecretString;

use crate::context::ResolutionContext;
use crate::error::SecretsError;
use crate::reference::SecretReference;
use crate::resolver::Resolver;

/// Resolve a raw config value if it is a secret reference.
///
/// `Ok(None)` means `input` is a plain value and the caller keeps it as-is.
/// Malformed references and resolution failures are errors.
pub async fn resolve_value(
	resolver: &dyn Resolver,
	ctx: &ResolutionContext,
	input: &str,
) -> Result<Option<SecretString>, SecretsError> {
	let Some(reference) = SecretReference::parse(input)? else {
		return Ok(None);
	};
	let value = resolver.resolve(ctx, &reference).await?;
	Ok(Some(value))
}
