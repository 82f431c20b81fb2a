// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The error object that flows through the capture pipeline.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Shared handle to an [`Exception`].
///
/// Deduplication is keyed by the allocation behind this `Arc`, not by the
/// exception's contents: two exceptions with the same name, message and stack
/// are still two different errors.
pub type ExceptionRef = Arc<Exception>;

/// Where an exception was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
	/// Raised by application code. Eligible for automatic reporting.
	#[default]
	Application,
	/// Raised by the SDK itself. Never reported automatically.
	Sdk,
}

/// HTTP request details attached to errors from failed outbound calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestMetadata {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub method: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

impl RequestMetadata {
	pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
		Self {
			method: Some(method.into()),
			url: Some(url.into()),
		}
	}
}

/// A captured error: name, message and optional raw stack text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
	name: String,
	message: String,
	stack: Option<String>,
	origin: Origin,
	request: Option<RequestMetadata>,
}

impl Exception {
	/// Creates an application exception without a stack.
	pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			message: message.into(),
			stack: None,
			origin: Origin::Application,
			request: None,
		}
	}

	/// Creates an exception whose stack starts at the caller and continues
	/// with a `std::backtrace` capture (honours `RUST_BACKTRACE`).
	#[track_caller]
	pub fn capture(name: impl Into<String>, message: impl Into<String>) -> Self {
		let location = Location::caller();
		let exception = Self::new(name, message);
		let stack = exception.stack_from(location, &Backtrace::capture());
		exception.with_stack(stack)
	}

	/// Converts any error into an exception, recording the caller as the
	/// innermost frame. The name is the error's type name.
	#[track_caller]
	pub fn from_error<E>(error: &E) -> Self
	where
		E: std::error::Error + ?Sized,
	{
		Self::capture(short_type_name(std::any::type_name::<E>()), error.to_string())
	}

	/// Builds the exception reported for a panic.
	pub fn from_panic(message: impl Into<String>, location: Option<&Location<'_>>, backtrace: &Backtrace) -> Self {
		let exception = Self::new("panic", message);
		let stack = match location {
			Some(location) => exception.stack_from(location, backtrace),
			None => format!("{}\n{backtrace}", exception.header()),
		};
		exception.with_stack(stack)
	}

	pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
		self.stack = Some(stack.into());
		self
	}

	pub fn with_origin(mut self, origin: Origin) -> Self {
		self.origin = origin;
		self
	}

	pub fn with_request(mut self, request: RequestMetadata) -> Self {
		self.request = Some(request);
		self
	}

	/// Wraps the exception in an [`ExceptionRef`].
	pub fn into_ref(self) -> ExceptionRef {
		Arc::new(self)
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn message(&self) -> &str {
		&self.message
	}

	pub fn stack(&self) -> Option<&str> {
		self.stack.as_deref()
	}

	pub fn origin(&self) -> Origin {
		self.origin
	}

	/// True for errors raised by the SDK itself.
	pub fn is_internal(&self) -> bool {
		self.origin == Origin::Sdk
	}

	pub fn request(&self) -> Option<&RequestMetadata> {
		self.request.as_ref()
	}

	fn header(&self) -> String {
		if self.message.is_empty() {
			self.name.clone()
		} else {
			format!("{}: {}", self.name, self.message)
		}
	}

	fn stack_from(&self, location: &Location<'_>, backtrace: &Backtrace) -> String {
		let mut stack = format!(
			"{}\n    at {}:{}:{}",
			self.header(),
			location.file(),
			location.line(),
			location.column()
		);
		if backtrace.status() == BacktraceStatus::Captured {
			stack.push('\n');
			stack.push_str(&backtrace.to_string());
		}
		stack
	}
}

impl fmt::Display for Exception {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.header())
	}
}

impl std::error::Error for Exception {}

/// `std::io::error::Error` -> `io::Error`, `my_app::AppError<T>` -> `AppError<T>`.
///
/// A bare `Error` keeps the nearest meaningful module so the name stays
/// recognisable.
fn short_type_name(full: &str) -> String {
	let base = full.split('<').next().unwrap_or(full);
	let generics = &full[base.len()..];
	let mut segments = base.rsplit("::");
	let last = segments.next().unwrap_or(base);
	let short = if last == "Error" {
		match segments.find(|s| *s != "error") {
			Some(module) => format!("{module}::{last}"),
			None => last.to_string(),
		}
	} else {
		last.to_string()
	};
	format!("{short}{generics}")
}
