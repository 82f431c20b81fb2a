// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Flytrap SDK.

use flytrap_common_config::EnvError;
use flytrap_core::{Exception, ExceptionRef, Origin};
use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, FlytrapError>;

/// Errors raised by the SDK.
///
/// Configuration errors are returned to the caller. Transport errors never
/// reach application code; they end up in [`crate::ReportOutcome::Failed`].
#[derive(Debug, Error)]
pub enum FlytrapError {
	/// `init` was called twice without `force`.
	#[error("Flytrap has already been initialized")]
	AlreadyInitialized,

	/// The SDK was used before `init`.
	#[error("Flytrap is not initialized, call init() first")]
	NotInitialized,

	/// Missing project ID.
	#[error("project ID is required")]
	MissingProjectId,

	/// Missing or empty API key.
	#[error("API key is required")]
	InvalidApiKey,

	/// Missing or malformed API endpoint.
	#[error("invalid API endpoint: {0:?}")]
	InvalidEndpoint(String),

	/// `init` was called outside a tokio runtime.
	#[error("Flytrap must be initialized from within a tokio runtime")]
	NoRuntime,

	/// Reading configuration from the environment failed.
	#[error("failed to load configuration from environment: {0}")]
	Env(#[from] EnvError),

	/// HTTP request failed before a response arrived.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// The ingestion API answered with a non-success status.
	#[error("server error (status {status}): {message}")]
	ServerError {
		/// HTTP status code.
		status: u16,
		/// Response body.
		message: String,
	},

	/// The ingestion API answered with a body that is not JSON.
	#[error("invalid response from ingestion API: {0}")]
	InvalidResponse(String),

	/// A report task was cancelled or panicked.
	#[error("report task failed: {0}")]
	TaskFailed(String),
}

impl FlytrapError {
	/// The exception form of this error, tagged as SDK-originated so the
	/// automatic hooks skip it instead of reporting the SDK's own failures.
	pub fn to_exception(&self) -> ExceptionRef {
		Exception::new("FlytrapError", self.to_string())
			.with_origin(Origin::Sdk)
			.into_ref()
	}

	/// True for failures of the ingestion round-trip.
	pub fn is_transport(&self) -> bool {
		matches!(
			self,
			Self::RequestFailed(_) | Self::ServerError { .. } | Self::InvalidResponse(_)
		)
	}
}
