// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source retrieval and code-context resolution for stack frames.

use std::sync::Arc;

use async_trait::async_trait;
use flytrap_core::{CodeContext, StackFrame};
use futures::future::join_all;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::error::{FlytrapError, Result};

/// Retrieves the text of a source file named by a stack frame.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
	async fn fetch(&self, location: &str) -> Result<String>;
}

/// Fetches `http(s)://` locations over HTTP and everything else from the
/// local filesystem (`file://` prefixes are stripped).
#[derive(Debug, Clone)]
pub struct HttpSourceFetcher {
	client: Client,
}

impl HttpSourceFetcher {
	pub fn new(client: Client) -> Self {
		Self { client }
	}
}

#[async_trait]
impl SourceFetcher for HttpSourceFetcher {
	async fn fetch(&self, location: &str) -> Result<String> {
		if location.starts_with("http://") || location.starts_with("https://") {
			let response = self.client.get(location).send().await?;
			let status = response.status();
			if !status.is_success() {
				return Err(FlytrapError::ServerError {
					status: status.as_u16(),
					message: format!("failed to fetch {location}"),
				});
			}
			return Ok(response.text().await?);
		}

		let path = location.strip_prefix("file://").unwrap_or(location);
		tokio::fs::read_to_string(path)
			.await
			.map_err(|e| FlytrapError::InvalidResponse(format!("failed to read {path}: {e}")))
	}
}

/// Strips a leading `function (` and a trailing `)` from a frame location.
///
/// `"handler (https://app/x.js"` -> `"https://app/x.js"`.
pub fn clean_location(location: &str) -> &str {
	let location = match location.find('(') {
		Some(open) => &location[open + 1..],
		None => location,
	};
	location.strip_suffix(')').unwrap_or(location)
}

/// Turns stack frames into code contexts by fetching their source.
pub struct SourceContextResolver {
	fetcher: Arc<dyn SourceFetcher>,
	radius: usize,
}

impl SourceContextResolver {
	pub fn new(fetcher: Arc<dyn SourceFetcher>, radius: usize) -> Self {
		Self { fetcher, radius }
	}

	/// Resolves every frame concurrently. Frames whose source cannot be
	/// fetched, or is empty, are dropped; the rest keep frame order.
	#[instrument(skip_all, fields(frames = frames.len()))]
	pub async fn resolve_all(&self, frames: &[StackFrame]) -> Vec<CodeContext> {
		let lookups = frames.iter().map(|frame| self.resolve(frame));
		join_all(lookups).await.into_iter().flatten().collect()
	}

	async fn resolve(&self, frame: &StackFrame) -> Option<CodeContext> {
		let location = clean_location(&frame.file);
		if location.is_empty() {
			return None;
		}
		match self.fetcher.fetch(location).await {
			Ok(source) if source.is_empty() => {
				debug!(file = %location, "Source file is empty, skipping frame");
				None
			}
			Ok(source) => Some(CodeContext::from_source(frame, &source, self.radius)),
			Err(e) => {
				debug!(file = %location, error = %e, "Failed to fetch source, skipping frame");
				None
			}
		}
	}
}
