// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Instance scoping for secret lookups.
//!
//! One config template serves many deployments. The instance name is
//! prefixed onto every reference so `${secret:database/main:password}`
//! resolves to different values for `myapp-prod` and `myapp-stable`.

use crate::reference::SecretReference;

/// Prefix of every environment variable the env resolver reads.
pub const ENV_VAR_PREFIX: &str = "FOUNDRY_SECRET_";

/// Scope for a batch of resolutions within one deployment instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionContext {
	instance: String,
	namespace: Option<String>,
}

impl ResolutionContext {
	pub fn new(instance: impl Into<String>) -> Self {
		Self {
			instance: instance.into(),
			namespace: None,
		}
	}

	/// Attach a namespace label. It shows up in logs and diagnostics only and
	/// never changes the derived lookup keys.
	pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
		self.namespace = Some(namespace.into());
		self
	}

	pub fn instance(&self) -> &str {
		&self.instance
	}

	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	/// `<instance>/<path>`, or just `<path>` without an instance.
	pub fn namespaced_path(&self, reference: &SecretReference) -> String {
		if self.instance.is_empty() {
			reference.path().to_string()
		} else {
			format!("{}/{}", self.instance, reference.path())
		}
	}

	/// `<namespaced path>:<key>`, the canonical lookup identity.
	pub fn full_key(&self, reference: &SecretReference) -> String {
		format!("{}:{}", self.namespaced_path(reference), reference.key())
	}

	/// `FOUNDRY_SECRET_` followed by the uppercased namespaced path and key,
	/// with `/`, `-` and `:` mapped to `_`.
	///
	/// Names that differ only by separator versus underscore collide
	/// (`a-b` and `a_b`).
	pub fn env_var_name(&self, reference: &SecretReference) -> String {
		let joined = format!("{}_{}", self.namespaced_path(reference), reference.key());
		let normalized: String = joined
			.chars()
			.map(|c| match c {
				'/' | '-' | ':' => '_',
				other => other.to_ascii_uppercase(),
			})
			.collect();
		format!("{ENV_VAR_PREFIX}{normalized}")
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn reference(path: &str, key: &str) -> SecretReference {
		SecretReference::new(path, key).unwrap()
	}

	#[test]
	fn derivations_with_instance() {
		let ctx = ResolutionContext::new("myapp-prod");
		let r = reference("database/prod", "password");

		assert_eq!(ctx.namespaced_path(&r), "myapp-prod/database/prod");
		assert_eq!(ctx.full_key(&r), "myapp-prod/database/prod:password");
		assert_eq!(
			ctx.env_var_name(&r),
			"FOUNDRY_SECRET_MYAPP_PROD_DATABASE_PROD_PASSWORD"
		);
	}

	#[test]
	fn empty_instance_uses_reference_alone() {
		let ctx = ResolutionContext::default();
		let r = reference("dns/cloudflare", "api-token");

		assert_eq!(ctx.namespaced_path(&r), "dns/cloudflare");
		assert_eq!(ctx.full_key(&r), "dns/cloudflare:api-token");
		assert_eq!(ctx.env_var_name(&r), "FOUNDRY_SECRET_DNS_CLOUDFLARE_API_TOKEN");
	}

	#[test]
	fn namespace_does_not_change_derivations() {
		let r = reference("database/main", "password");
		let plain = ResolutionContext::new("myapp-prod");
		let labelled = ResolutionContext::new("myapp-prod").with_namespace("eu-west");

		assert_eq!(labelled.namespace(), Some("eu-west"));
		assert_eq!(plain.full_key(&r), labelled.full_key(&r));
		assert_eq!(plain.env_var_name(&r), labelled.env_var_name(&r));
	}

	#[test]
	fn separator_collision_is_a_known_limitation() {
		let ctx = ResolutionContext::new("app");
		assert_eq!(
			ctx.env_var_name(&reference("a-b", "k")),
			ctx.env_var_name(&reference("a_b", "k"))
		);
	}

	proptest! {
		#[test]
		fn distinct_instances_never_share_lookup_keys(
			i1 in "[a-z][a-z0-9]{0,10}",
			i2 in "[a-z][a-z0-9]{0,10}",
			path in "[a-z0-9]{1,8}(/[a-z0-9]{1,8}){0,2}",
			key in "[a-z0-9]{1,8}",
		) {
			prop_assume!(i1 != i2);
			let r = reference(&path, &key);
			let (a, b) = (ResolutionContext::new(i1), ResolutionContext::new(i2));

			prop_assert_ne!(a.namespaced_path(&r), b.namespaced_path(&r));
			prop_assert_ne!(a.full_key(&r), b.full_key(&r));
			prop_assert_ne!(a.env_var_name(&r), b.env_var_name(&r));
		}
	}
}
