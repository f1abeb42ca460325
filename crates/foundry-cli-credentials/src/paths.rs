// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG-style location of Foundry's per-user configuration directory.

use std::path::PathBuf;

use crate::TokenStoreError;

/// Directory name under the XDG config home.
pub const APP_DIR: &str = "foundry";

/// File name of the auth token fallback inside the config directory.
pub const TOKEN_FILE_NAME: &str = "auth-token";

/// Resolve `$XDG_CONFIG_HOME/foundry`, falling back to `~/.config/foundry`.
pub fn config_dir() -> Result<PathBuf, TokenStoreError> {
	let config_home = match std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
		Some(dir) => PathBuf::from(dir),
		None => dirs::home_dir()
			.ok_or(TokenStoreError::HomeDirNotFound)?
			.join(".config"),
	};

	let dir = config_home.join(APP_DIR);
	tracing::debug!(config_dir = %dir.display(), "resolved foundry config directory");
	Ok(dir)
}

/// Default location of the fallback token file.
pub fn token_file_path() -> Result<PathBuf, TokenStoreError> {
	Ok(config_dir()?.join(TOKEN_FILE_NAME))
}
