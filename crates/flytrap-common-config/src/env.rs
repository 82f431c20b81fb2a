// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Environment variable helpers.

use std::path::PathBuf;
use std::{env, fs};

use thiserror::Error;

use crate::secret::SecretString;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum EnvError {
	#[error("failed to read secret file at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("secret file path in {var} is empty")]
	EmptyPath { var: String },

	#[error("{var} must be a boolean (true/false/1/0/yes/no), got {value:?}")]
	InvalidFlag { var: String, value: String },
}

/// Load a secret using the `VAR` / `VAR_FILE` convention.
///
/// `VAR_FILE` wins when both are set. A single trailing newline in the file
/// is stripped. Returns `Ok(None)` when neither variable is present.
pub fn load_secret_env(var: &str) -> Result<Option<SecretString>, EnvError> {
	let file_var = format!("{var}_FILE");

	if let Ok(path) = env::var(&file_var) {
		if path.is_empty() {
			return Err(EnvError::EmptyPath { var: file_var });
		}

		let path = PathBuf::from(path);
		let content = fs::read_to_string(&path).map_err(|source| EnvError::Io {
			path: path.clone(),
			source,
		})?;
		let value = content.strip_suffix('\n').unwrap_or(&content);
		return Ok(Some(SecretString::new(value.to_string())));
	}

	Ok(env::var(var).ok().map(SecretString::new))
}

/// Read a boolean flag. Unset or empty variables yield `Ok(None)`.
pub fn env_flag(var: &str) -> Result<Option<bool>, EnvError> {
	let Ok(raw) = env::var(var) else {
		return Ok(None);
	};

	match raw.trim().to_ascii_lowercase().as_str() {
		"" => Ok(None),
		"1" | "true" | "yes" | "on" => Ok(Some(true)),
		"0" | "false" | "no" | "off" => Ok(Some(false)),
		_ => Err(EnvError::InvalidFlag {
			var: var.to_string(),
			value: raw,
		}),
	}
}
