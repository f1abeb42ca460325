// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Owner-only token file used when the OS vault is unavailable.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use foundry_common_secret::SecretString;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::TokenStoreError;

/// Single-token file, written 0600 inside a 0700 directory on Unix.
#[derive(Debug, Clone)]
pub struct TokenFile {
	path: PathBuf,
}

impl TokenFile {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Read the token. A missing or empty file is `Ok(None)`.
	pub async fn read(&self) -> Result<Option<SecretString>, TokenStoreError> {
		let contents = match fs::read_to_string(&self.path).await {
			Ok(contents) => SecretString::new(contents),
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(TokenStoreError::io(&self.path, e)),
		};

		let token = contents.expose().trim_end_matches(['\r', '\n']);
		if token.is_empty() {
			return Ok(None);
		}
		Ok(Some(SecretString::new(token.to_string())))
	}

	/// Replace the file contents with `token`.
	///
	/// Writes a sibling temp file created with mode 0600 and renames it over
	/// the target, so readers never observe a partial token.
	pub async fn write(&self, token: &SecretString) -> Result<(), TokenStoreError> {
		if let Some(parent) = self.path.parent() {
			create_private_dir(parent).await?;
		}

		let temp_path = self.path.with_extension("tmp");
		let mut options = fs::OpenOptions::new();
		options.write(true).create(true).truncate(true);
		#[cfg(unix)]
		options.mode(0o600);

		let mut file = options
			.open(&temp_path)
			.await
			.map_err(|e| TokenStoreError::io(&temp_path, e))?;
		file
			.write_all(token.expose().as_bytes())
			.await
			.map_err(|e| TokenStoreError::io(&temp_path, e))?;
		file
			.sync_all()
			.await
			.map_err(|e| TokenStoreError::io(&temp_path, e))?;
		drop(file);

		// The temp file may predate this call with looser permissions.
		#[cfg(unix)]
		set_mode(&temp_path, 0o600).await?;

		fs::rename(&temp_path, &self.path)
			.await
			.map_err(|e| TokenStoreError::io(&self.path, e))?;

		debug!(path = %self.path.display(), "auth token written to fallback file");
		Ok(())
	}

	/// Remove the file. A missing file counts as success.
	pub async fn delete(&self) -> Result<(), TokenStoreError> {
		match fs::remove_file(&self.path).await {
			Ok(()) => {
				debug!(path = %self.path.display(), "auth token fallback file removed");
				Ok(())
			}
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(TokenStoreError::io(&self.path, e)),
		}
	}

	pub async fn exists(&self) -> bool {
		fs::try_exists(&self.path).await.unwrap_or(false)
	}
}

async fn create_private_dir(dir: &Path) -> Result<(), TokenStoreError> {
	let mut builder = fs::DirBuilder::new();
	builder.recursive(true);
	#[cfg(unix)]
	builder.mode(0o700);
	builder
		.create(dir)
		.await
		.map_err(|e| TokenStoreError::io(dir, e))?;

	#[cfg(unix)]
	set_mode(dir, 0o700).await?;
	Ok(())
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), TokenStoreError> {
	use std::os::unix::fs::PermissionsExt;

	fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
		.await
		.map_err(|e| TokenStoreError::io(path, e))
}
