// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration primitives shared by the Flytrap crates.
//!
//! - [`Secret<T>`]: keeps the ingestion API key out of logs and config dumps
//! - [`load_secret_env`]: reads a secret from `VAR` or from the file named by
//!   `VAR_FILE`
//! - [`env_flag`]: parses boolean feature flags from the environment

pub mod env;
pub mod secret;

pub use env::{env_flag, load_secret_env, EnvError};
pub use secret::{Secret, SecretString, REDACTED};
