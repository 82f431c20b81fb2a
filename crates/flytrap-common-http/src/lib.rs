// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client construction for Flytrap.
//!
//! Every outbound request the SDK makes (log submission, source fetches, the
//! public IP lookup) goes through a client built here so that the collection
//! backend sees one consistent `User-Agent`.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

/// Name reported in the `User-Agent` header.
pub const SDK_NAME: &str = "flytrap-rust";

/// Version reported in the `User-Agent` header.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the SDK `User-Agent` string.
///
/// Format: `flytrap-rust/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"{SDK_NAME}/{SDK_VERSION} ({}-{})",
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

/// Creates a client builder carrying the SDK `User-Agent`.
///
/// # Example
/// ```ignore
/// let client = flytrap_common_http::builder()
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// Builds a client with the SDK `User-Agent` and the given request timeout.
///
/// Idle connections are not pooled. A pooled connection is driven by the
/// runtime that opened it, and panic reports are sent from a runtime of
/// their own.
pub fn client_with_timeout(timeout: Duration) -> reqwest::Result<Client> {
	builder().timeout(timeout).pool_max_idle_per_host(0).build()
}
