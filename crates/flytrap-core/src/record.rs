// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Incoming failure signals and the outgoing log record.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::context::CodeContext;
use crate::exception::{Exception, ExceptionRef};

/// A rejected value that is not an error: string, number, bool, object or null.
pub type RejectionValue = serde_json::Value;

/// A failure entering the pipeline, classified by how it was observed.
#[derive(Debug, Clone)]
pub enum CapturedSignal {
	/// An error raised and not handled by application code, or one passed to
	/// manual capture.
	NativeError(ExceptionRef),
	/// A task failed with something that is not an error.
	RejectedValue(RejectionValue),
	/// An error raised while rendering a component tree.
	RenderError {
		error: ExceptionRef,
		component_stack: Option<String>,
	},
}

impl CapturedSignal {
	/// The exception carried by the error variants.
	pub fn exception(&self) -> Option<&ExceptionRef> {
		match self {
			Self::NativeError(error) | Self::RenderError { error, .. } => Some(error),
			Self::RejectedValue(_) => None,
		}
	}

	/// Short label used in logs.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::NativeError(_) => "error",
			Self::RejectedValue(_) => "rejection",
			Self::RenderError { .. } => "render_error",
		}
	}
}

/// Wire form of an exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorData {
	pub name: String,
	pub message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

impl From<&Exception> for ErrorData {
	fn from(exception: &Exception) -> Self {
		Self {
			name: exception.name().to_string(),
			message: exception.message().to_string(),
			stack: exception.stack().map(str::to_string),
		}
	}
}

/// Exactly one of `error` or `value` is present on every record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordPayload {
	Error { error: ErrorData },
	Rejection { value: RejectionValue },
}

/// The unit submitted to the ingestion API, wrapped as `{"data": record}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
	#[serde(flatten)]
	pub payload: RecordPayload,
	#[serde(rename = "codeContexts")]
	pub code_contexts: Vec<CodeContext>,
	pub handled: bool,
	/// ISO-8601 with millisecond precision, e.g. `2025-01-31T12:00:00.000Z`.
	pub timestamp: String,
	pub project_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub method: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub ip: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub os: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub browser: Option<String>,
	#[serde(rename = "componentStack", skip_serializing_if = "Option::is_none")]
	pub component_stack: Option<String>,
}

impl LogRecord {
	/// Starts a record for `payload`, stamped with `at`. Optional metadata is
	/// filled in by the caller.
	pub fn new(payload: RecordPayload, handled: bool, project_id: impl Into<String>, at: DateTime<Utc>) -> Self {
		Self {
			payload,
			code_contexts: Vec::new(),
			handled,
			timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
			project_id: project_id.into(),
			method: None,
			path: None,
			ip: None,
			os: None,
			browser: None,
			component_stack: None,
		}
	}

	pub fn is_error(&self) -> bool {
		matches!(self.payload, RecordPayload::Error { .. })
	}
}
