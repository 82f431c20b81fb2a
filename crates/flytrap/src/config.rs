// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! SDK configuration and its write-once store.

use std::sync::Arc;
use std::time::Duration;

use flytrap_common_config::{env_flag, load_secret_env, SecretString};
use flytrap_core::DEFAULT_CONTEXT_LINES;
use parking_lot::RwLock;
use tracing::info;

use crate::error::{FlytrapError, Result};

/// Public IP echo service queried for the `ip` field.
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

/// Configuration for a Flytrap instance.
#[derive(Debug, Clone)]
pub struct Config {
	/// Project the reports belong to.
	pub project_id: String,
	/// Base URL of the ingestion API, without a trailing slash.
	pub api_endpoint: String,
	/// Sent as the `x-api-key` header.
	pub api_key: SecretString,
	/// Fetch source files and attach code snippets to error reports.
	pub include_context: bool,
	/// Lines captured on each side of a frame's line.
	pub context_lines: usize,
	/// Timeout for every outbound HTTP request.
	pub request_timeout: Duration,
	/// IP echo service; `None` disables the lookup.
	pub ip_lookup_url: Option<String>,
	/// User-agent string describing the host (e.g. the embedding webview).
	/// When absent the host OS is reported and the browser is left empty.
	pub user_agent: Option<String>,
	/// Install the panic hook during `init`.
	pub capture_panics: bool,
	/// How long a panicking thread outside the runtime waits for its report.
	pub panic_flush_timeout: Duration,
}

impl Config {
	/// Creates a new builder.
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder::new()
	}

	/// Loads configuration from the environment.
	///
	/// Reads `FLYTRAP_PROJECT_ID`, `FLYTRAP_API_ENDPOINT`, `FLYTRAP_API_KEY`
	/// (or `FLYTRAP_API_KEY_FILE`), `FLYTRAP_INCLUDE_CONTEXT` and
	/// `FLYTRAP_CAPTURE_PANICS`.
	pub fn from_env() -> Result<Self> {
		let mut builder = Self::builder();

		if let Ok(project_id) = std::env::var("FLYTRAP_PROJECT_ID") {
			builder = builder.project_id(project_id);
		}
		if let Ok(endpoint) = std::env::var("FLYTRAP_API_ENDPOINT") {
			builder = builder.api_endpoint(endpoint);
		}
		if let Some(key) = load_secret_env("FLYTRAP_API_KEY")? {
			builder.api_key = Some(key);
		}
		if let Some(include) = env_flag("FLYTRAP_INCLUDE_CONTEXT")? {
			builder = builder.include_context(include);
		}
		if let Some(capture) = env_flag("FLYTRAP_CAPTURE_PANICS")? {
			builder = builder.capture_panics(capture);
		}

		builder.build()
	}
}

/// Builder for [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder {
	project_id: Option<String>,
	api_endpoint: Option<String>,
	api_key: Option<SecretString>,
	include_context: bool,
	context_lines: usize,
	request_timeout: Duration,
	ip_lookup_url: Option<String>,
	user_agent: Option<String>,
	capture_panics: bool,
	panic_flush_timeout: Duration,
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			project_id: None,
			api_endpoint: None,
			api_key: None,
			include_context: true,
			context_lines: DEFAULT_CONTEXT_LINES,
			request_timeout: Duration::from_secs(30),
			ip_lookup_url: Some(DEFAULT_IP_LOOKUP_URL.to_string()),
			user_agent: None,
			capture_panics: true,
			panic_flush_timeout: Duration::from_secs(2),
		}
	}

	pub fn project_id(mut self, id: impl Into<String>) -> Self {
		self.project_id = Some(id.into());
		self
	}

	/// Example: `https://flytrap.example.com`
	pub fn api_endpoint(mut self, url: impl Into<String>) -> Self {
		self.api_endpoint = Some(url.into());
		self
	}

	pub fn api_key(mut self, key: impl Into<String>) -> Self {
		self.api_key = Some(SecretString::new(key.into()));
		self
	}

	/// Defaults to `true`.
	pub fn include_context(mut self, include: bool) -> Self {
		self.include_context = include;
		self
	}

	pub fn context_lines(mut self, lines: usize) -> Self {
		self.context_lines = lines;
		self
	}

	pub fn request_timeout(mut self, timeout: Duration) -> Self {
		self.request_timeout = timeout;
		self
	}

	/// Overrides the IP echo service. The service must answer
	/// `{"ip": "..."}`.
	pub fn ip_lookup_url(mut self, url: impl Into<String>) -> Self {
		self.ip_lookup_url = Some(url.into());
		self
	}

	/// Skips the public IP lookup entirely.
	pub fn disable_ip_lookup(mut self) -> Self {
		self.ip_lookup_url = None;
		self
	}

	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());
		self
	}

	/// Defaults to `true`.
	pub fn capture_panics(mut self, capture: bool) -> Self {
		self.capture_panics = capture;
		self
	}

	pub fn panic_flush_timeout(mut self, timeout: Duration) -> Self {
		self.panic_flush_timeout = timeout;
		self
	}

	pub fn build(self) -> Result<Config> {
		let project_id = self
			.project_id
			.filter(|id| !id.trim().is_empty())
			.ok_or(FlytrapError::MissingProjectId)?;
		let api_key = self
			.api_key
			.filter(|key| !key.expose().trim().is_empty())
			.ok_or(FlytrapError::InvalidApiKey)?;
		let api_endpoint = self
			.api_endpoint
			.ok_or_else(|| FlytrapError::InvalidEndpoint(String::new()))?;

		let api_endpoint = api_endpoint.trim().trim_end_matches('/').to_string();
		if !(api_endpoint.starts_with("http://") || api_endpoint.starts_with("https://")) {
			return Err(FlytrapError::InvalidEndpoint(api_endpoint));
		}

		Ok(Config {
			project_id,
			api_endpoint,
			api_key,
			include_context: self.include_context,
			context_lines: self.context_lines,
			request_timeout: self.request_timeout,
			ip_lookup_url: self.ip_lookup_url,
			user_agent: self.user_agent,
			capture_panics: self.capture_panics,
			panic_flush_timeout: self.panic_flush_timeout,
		})
	}
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Write-once holder for the active [`Config`].
///
/// Replaces the usual process-global: each `Flytrap` instance owns one.
#[derive(Debug, Default)]
pub struct ConfigStore {
	current: RwLock<Option<Arc<Config>>>,
}

impl ConfigStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `config`. Fails if a config is already stored, unless `force`.
	pub fn init(&self, config: Config, force: bool) -> Result<Arc<Config>> {
		let mut current = self.current.write();
		if current.is_some() && !force {
			return Err(FlytrapError::AlreadyInitialized);
		}

		let config = Arc::new(config);
		info!(
			project_id = %config.project_id,
			api_endpoint = %config.api_endpoint,
			include_context = config.include_context,
			reinitialized = current.is_some(),
			"Flytrap configured"
		);
		*current = Some(Arc::clone(&config));
		Ok(config)
	}

	/// The active config. Fails if `init` was never called.
	pub fn get(&self) -> Result<Arc<Config>> {
		self.current.read().clone().ok_or(FlytrapError::NotInitialized)
	}

	pub fn is_initialized(&self) -> bool {
		self.current.read().is_some()
	}
}
