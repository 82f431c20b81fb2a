// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Submission of log records to the ingestion API.

use std::fmt;

use async_trait::async_trait;
use flytrap_common_config::SecretString;
use flytrap_core::LogRecord;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{FlytrapError, Result};

/// Header carrying the project API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Ingestion route for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IngestRoute {
	/// `/api/errors`, for records carrying an error.
	Errors,
	/// `/api/rejections`, for records carrying a rejected value.
	Rejections,
}

impl IngestRoute {
	pub fn for_record(record: &LogRecord) -> Self {
		if record.is_error() {
			Self::Errors
		} else {
			Self::Rejections
		}
	}

	pub fn path(self) -> &'static str {
		match self {
			Self::Errors => "/api/errors",
			Self::Rejections => "/api/rejections",
		}
	}
}

impl fmt::Display for IngestRoute {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.path())
	}
}

/// Request body: `{"data": <record>}`.
#[derive(Debug, Serialize)]
pub struct IngestEnvelope<'a> {
	pub data: &'a LogRecord,
}

#[derive(Debug, Deserialize)]
struct IngestResponse {
	status: u16,
	data: IngestResponseData,
}

#[derive(Debug, Deserialize)]
struct IngestResponseData {
	message: String,
}

/// What the ingestion API said about an accepted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
	/// HTTP status of the response.
	pub status: u16,
	/// `data.message` from the response, when it had the expected shape.
	pub message: Option<String>,
}

/// Sends log records to the backend.
#[async_trait]
pub trait Transport: Send + Sync {
	async fn submit(&self, route: IngestRoute, record: &LogRecord) -> Result<Delivery>;
}

/// HTTP transport posting JSON to `{api_endpoint}{route}`.
pub struct HttpTransport {
	client: Client,
	api_endpoint: String,
	api_key: SecretString,
}

impl HttpTransport {
	pub fn new(client: Client, api_endpoint: impl Into<String>, api_key: SecretString) -> Self {
		Self {
			client,
			api_endpoint: api_endpoint.into(),
			api_key,
		}
	}

	fn url(&self, route: IngestRoute) -> String {
		format!("{}{}", self.api_endpoint, route.path())
	}
}

#[async_trait]
impl Transport for HttpTransport {
	#[instrument(skip_all, fields(route = %route))]
	async fn submit(&self, route: IngestRoute, record: &LogRecord) -> Result<Delivery> {
		let response = self
			.client
			.post(self.url(route))
			.header(API_KEY_HEADER, self.api_key.expose())
			.json(&IngestEnvelope { data: record })
			.send()
			.await?;

		let status = response.status().as_u16();
		let body = response.text().await?;

		if !(200..300).contains(&status) {
			warn!(status, message = %body, "[flytrap] Ingestion API rejected the report");
			return Err(FlytrapError::ServerError { status, message: body });
		}

		let value: serde_json::Value =
			serde_json::from_str(&body).map_err(|_| FlytrapError::InvalidResponse(body.clone()))?;

		match serde_json::from_value::<IngestResponse>(value) {
			Ok(parsed) => {
				debug!(
					status,
					reported_status = parsed.status,
					message = %parsed.data.message,
					"Report delivered"
				);
				Ok(Delivery {
					status,
					message: Some(parsed.data.message),
				})
			}
			Err(e) => {
				warn!(status, error = %e, "[flytrap] Unexpected response shape from ingestion API");
				Ok(Delivery { status, message: None })
			}
		}
	}
}
