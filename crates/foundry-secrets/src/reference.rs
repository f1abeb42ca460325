// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! `${secret:<path>:<key>}` placeholder grammar.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ReferenceError;

/// Opening delimiter of a secret reference.
pub const REFERENCE_PREFIX: &str = "${secret:";

/// Closing delimiter of a secret reference.
pub const REFERENCE_SUFFIX: &str = "}";

/// A parsed `${secret:<path>:<key>}` placeholder.
///
/// Identity is `(path, key)`. The original text is kept only so that
/// `Display` can echo it back verbatim.
#[derive(Debug, Clone)]
pub struct SecretReference {
	path: String,
	key: String,
	raw: Option<String>,
}

impl SecretReference {
	/// Build a reference in code, validating `path` and `key` with the same
	/// rules the parser applies.
	pub fn new(path: impl Into<String>, key: impl Into<String>) -> Result<Self, ReferenceError> {
		let path = path.into();
		let key = key.into();
		let canonical = format!("{REFERENCE_PREFIX}{path}:{key}{REFERENCE_SUFFIX}");
		validate_path(&canonical, &path)?;
		validate_key(&canonical, &key)?;
		Ok(Self {
			path,
			key,
			raw: None,
		})
	}

	/// Parse `input`.
	///
	/// Returns `Ok(None)` when the text is not shaped like a reference at all,
	/// so plain config values pass through untouched. Text that opens with
	/// `${secret:` and closes with `}` but breaks the grammar is an error.
	pub fn parse(input: &str) -> Result<Option<Self>, ReferenceError> {
		if !is_reference(input) {
			return Ok(None);
		}

		let raw = input.trim();
		let body = &raw[REFERENCE_PREFIX.len()..raw.len() - REFERENCE_SUFFIX.len()];
		let segments: Vec<&str> = body.split(':').collect();

		let (path, key) = match segments.as_slice() {
			[path, key] => (*path, *key),
			[_] => {
				return Err(ReferenceError::malformed(
					raw,
					"expected '<path>:<key>' after 'secret:'",
				))
			}
			_ => {
				return Err(ReferenceError::malformed(
					raw,
					format!(
						"expected exactly 2 ':'-separated segments after 'secret:', found {}",
						segments.len()
					),
				))
			}
		};

		validate_path(raw, path)?;
		validate_key(raw, key)?;

		Ok(Some(Self {
			path: path.to_string(),
			key: key.to_string(),
			raw: Some(raw.to_string()),
		}))
	}

	pub fn path(&self) -> &str {
		&self.path
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	/// The trimmed source text, when this reference came from [`parse`](Self::parse).
	pub fn raw(&self) -> Option<&str> {
		self.raw.as_deref()
	}
}

/// Cheap delimiter check used to skip the full grammar for plain values.
pub fn is_reference(input: &str) -> bool {
	let trimmed = input.trim();
	trimmed.len() >= REFERENCE_PREFIX.len() + REFERENCE_SUFFIX.len()
		&& trimmed.starts_with(REFERENCE_PREFIX)
		&& trimmed.ends_with(REFERENCE_SUFFIX)
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn validate_path(input: &str, path: &str) -> Result<(), ReferenceError> {
	if path.is_empty() {
		return Err(ReferenceError::malformed(input, "path is empty"));
	}
	if let Some(bad) = path.chars().find(|c| !is_name_char(*c) && *c != '/') {
		return Err(ReferenceError::malformed(
			input,
			format!("invalid character '{bad}' in path '{path}'"),
		));
	}
	if path.split('/').any(str::is_empty) {
		return Err(ReferenceError::malformed(
			input,
			format!("path '{path}' has an empty segment"),
		));
	}
	Ok(())
}

fn validate_key(input: &str, key: &str) -> Result<(), ReferenceError> {
	if key.is_empty() {
		return Err(ReferenceError::malformed(input, "key is empty"));
	}
	if let Some(bad) = key.chars().find(|c| !is_name_char(*c)) {
		return Err(ReferenceError::malformed(
			input,
			format!("invalid character '{bad}' in key '{key}'"),
		));
	}
	Ok(())
}

impl fmt::Display for SecretReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.raw {
			Some(raw) => f.write_str(raw),
			None => write!(
				f,
				"{REFERENCE_PREFIX}{}:{}{REFERENCE_SUFFIX}",
				self.path, self.key
			),
		}
	}
}

impl PartialEq for SecretReference {
	fn eq(&self, other: &Self) -> bool {
		self.path == other.path && self.key == other.key
	}
}

impl Eq for SecretReference {}

impl Hash for SecretReference {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.path.hash(state);
		self.key.hash(state);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn malformed_reason(input: &str) -> String {
		match SecretReference::parse(input) {
			Err(ReferenceError::Malformed { reason, .. }) => reason,
			other => panic!("expected malformed error for {input:?}, got {other:?}"),
		}
	}

	#[test]
	fn parses_nested_path_and_key() {
		let reference = SecretReference::parse("${secret:database/prod:password}")
			.unwrap()
			.unwrap();
		assert_eq!(reference.path(), "database/prod");
		assert_eq!(reference.key(), "password");
		assert_eq!(reference.raw(), Some("${secret:database/prod:password}"));
	}

	#[test]
	fn surrounding_whitespace_is_ignored() {
		let reference = SecretReference::parse("  ${secret:dns/cloudflare:api_token}\n")
			.unwrap()
			.unwrap();
		assert_eq!(reference.path(), "dns/cloudflare");
		assert_eq!(reference.to_string(), "${secret:dns/cloudflare:api_token}");
	}

	#[test]
	fn plain_values_are_not_references() {
		for input in [
			"",
			"hunter2",
			"${secret:database:password",
			"secret:database:password}",
			"${env:HOME}",
			"prefix ${secret:a:b}",
		] {
			assert!(!is_reference(input), "{input:?}");
			assert_eq!(SecretReference::parse(input).unwrap(), None, "{input:?}");
		}
	}

	#[test]
	fn wrong_segment_counts_are_malformed() {
		assert!(malformed_reason("${secret:}").contains("'<path>:<key>'"));
		assert!(malformed_reason("${secret:database}").contains("'<path>:<key>'"));
		assert!(malformed_reason("${secret:a:b:c}").contains("found 3"));
	}

	#[test]
	fn empty_path_or_key_is_malformed() {
		assert_eq!(malformed_reason("${secret::password}"), "path is empty");
		assert_eq!(malformed_reason("${secret:database:}"), "key is empty");
		assert!(malformed_reason("${secret:/database:password}").contains("empty segment"));
		assert!(malformed_reason("${secret:a//b:password}").contains("empty segment"));
	}

	#[test]
	fn illegal_characters_are_named() {
		assert!(malformed_reason("${secret:data base:password}").contains("' '"));
		assert!(malformed_reason("${secret:db@host:password}").contains("'@'"));
		assert!(malformed_reason("${secret:db:pass!}").contains("'!'"));
		assert!(malformed_reason("${secret:db:a/b}").contains("'/'"));
		assert!(malformed_reason("${secret:db:key}}").contains("'}'"));
	}

	#[test]
	fn error_message_includes_input() {
		let err = SecretReference::parse("${secret:db@host:password}").unwrap_err();
		assert!(err.to_string().contains("${secret:db@host:password}"));
	}

	#[test]
	fn programmatic_reference_displays_canonical_form() {
		let reference = SecretReference::new("ssh/deploy", "private_key").unwrap();
		assert_eq!(reference.raw(), None);
		assert_eq!(reference.to_string(), "${secret:ssh/deploy:private_key}");
	}

	#[test]
	fn programmatic_reference_is_validated() {
		assert!(SecretReference::new("", "k").is_err());
		assert!(SecretReference::new("p", "").is_err());
		assert!(SecretReference::new("p:q", "k").is_err());
	}

	#[test]
	fn identity_ignores_raw_text() {
		let parsed = SecretReference::parse(" ${secret:a/b:c} ").unwrap().unwrap();
		let built = SecretReference::new("a/b", "c").unwrap();
		assert_eq!(parsed, built);
	}

	proptest! {
		#[test]
		fn valid_references_roundtrip(
			path in "[A-Za-z0-9_-]{1,12}(/[A-Za-z0-9_-]{1,12}){0,3}",
			key in "[A-Za-z0-9_-]{1,16}",
		) {
			let literal = format!("${{secret:{path}:{key}}}");
			let reference = SecretReference::parse(&literal).unwrap().unwrap();
			prop_assert_eq!(reference.path(), path.as_str());
			prop_assert_eq!(reference.key(), key.as_str());
			prop_assert_eq!(reference.to_string(), literal);
		}

		#[test]
		fn bad_characters_never_pass_silently(
			path in "[A-Za-z0-9]{1,8}",
			bad in "[ @!#%&*+=?,.;]",
		) {
			let literal = format!("${{secret:{path}{bad}x:key}}");
			prop_assert!(is_reference(&literal));
			prop_assert!(SecretReference::parse(&literal).is_err());
		}
	}
}
