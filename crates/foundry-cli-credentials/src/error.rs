// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Auth token store error types.

use std::path::PathBuf;

/// Errors raised by the auth token store and its backends.
#[derive(Debug, thiserror::Error)]
pub enum TokenStoreError {
	/// The caller tried to store an empty token.
	#[error("auth token must not be empty")]
	InvalidToken,

	/// Neither the vault nor the fallback file holds a token. Expected on
	/// first use; callers should prompt for login.
	#[error("no auth token found; log in to store one")]
	NotFound,

	/// The OS vault could not be reached or rejected the operation.
	#[error("token vault unavailable: {0}")]
	Unavailable(String),

	/// Reading or writing the fallback file failed.
	#[error("I/O error on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// Both the vault and the file refused to delete the token.
	#[error("failed to clear auth token (vault: {vault}; file: {file})")]
	ClearFailed { vault: String, file: String },

	#[error("could not determine home directory")]
	HomeDirNotFound,
}

impl TokenStoreError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		Self::Io {
			path: path.into(),
			source,
		}
	}

	pub(crate) fn unavailable(msg: impl Into<String>) -> Self {
		Self::Unavailable(msg.into())
	}

	/// True for the "nothing stored yet" case.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound)
	}
}
