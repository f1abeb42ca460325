// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Local developer override file.
//!
//! One `<instance>/<path>:<key>=<value>` entry per line. Blank lines and lines
//! starting with `#` are skipped. The first `=` splits key from value; the
//! value is kept byte-for-byte, including surrounding whitespace.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use foundry_common_secret::SecretString;
use tracing::{debug, warn};

use crate::context::ResolutionContext;
use crate::error::{OverrideFileError, ResolveError};
use crate::reference::SecretReference;
use crate::resolver::Resolver;

/// Resolver over an override table read once at construction.
#[derive(Debug)]
pub struct OverrideFileResolver {
	path: PathBuf,
	entries: HashMap<String, SecretString>,
}

impl OverrideFileResolver {
	/// Read and parse `path`. A missing file yields an empty table.
	pub async fn load(path: impl Into<PathBuf>) -> Result<Self, OverrideFileError> {
		let path = path.into();
		let contents = match tokio::fs::read_to_string(&path).await {
			Ok(contents) => SecretString::new(contents),
			Err(e) if e.kind() == ErrorKind::NotFound => {
				debug!(path = %path.display(), "override file absent, using empty table");
				return Ok(Self {
					path,
					entries: HashMap::new(),
				});
			}
			Err(e) => return Err(OverrideFileError::Io { path, source: e }),
		};

		Self::parse(path, contents.expose())
	}

	/// Build the table from already-read `contents`; `path` is used for
	/// diagnostics only.
	pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<Self, OverrideFileError> {
		let path = path.into();
		let mut entries = HashMap::new();

		for (index, line) in contents.lines().enumerate() {
			let line_no = index + 1;
			let trimmed = line.trim_start();
			if trimmed.is_empty() || trimmed.starts_with('#') {
				continue;
			}

			let Some((key, value)) = line.split_once('=') else {
				return Err(OverrideFileError::MissingSeparator {
					path,
					line: line_no,
				});
			};

			let key = key.trim();
			if key.is_empty() {
				return Err(OverrideFileError::EmptyKey {
					path,
					line: line_no,
				});
			}

			if entries
				.insert(key.to_string(), SecretString::new(value.to_string()))
				.is_some()
			{
				warn!(
					path = %path.display(),
					line = line_no,
					key = %key,
					"duplicate override entry, later value wins"
				);
			}
		}

		debug!(path = %path.display(), entries = entries.len(), "loaded override file");
		Ok(Self { path, entries })
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[async_trait]
impl Resolver for OverrideFileResolver {
	fn name(&self) -> &str {
		"override-file"
	}

	async fn resolve(
		&self,
		ctx: &ResolutionContext,
		reference: &SecretReference,
	) -> Result<SecretString, ResolveError> {
		let full_key = ctx.full_key(reference);
		self.entries.get(&full_key).cloned().ok_or_else(|| {
			ResolveError::not_found(format!(
				"{full_key} not found in override file {}",
				self.path.display()
			))
		})
	}
}
