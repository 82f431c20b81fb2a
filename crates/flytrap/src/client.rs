// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `Flytrap` client: the application-facing entry point.

use std::future::Future;
use std::sync::Arc;

use flytrap_core::{Exception, ExceptionRef, RequestMetadata};
use tokio::task::JoinHandle;

use crate::boundary::ErrorBoundary;
use crate::config::Config;
use crate::coordinator::{CaptureCoordinator, Rejection, ReportHandle};
use crate::error::Result;

/// Client for capturing errors and reporting them to Flytrap.
///
/// # Example
///
/// ```ignore
/// use flytrap::{Config, Flytrap};
///
/// let flytrap = Flytrap::new();
/// flytrap.init(
///     Config::builder()
///         .project_id("proj_xxx")
///         .api_endpoint("https://flytrap.example.com")
///         .api_key("your_api_key")
///         .build()?,
///     false,
/// )?;
///
/// // Panics are reported by the hook installed during init.
///
/// // Tasks that fail with Err are reported as unhandled rejections.
/// flytrap.spawn_supervised(async {
///     sync_inbox().await.map_err(|e| Rejection::error(&e))
/// })?;
///
/// // Manual capture
/// if let Err(e) = do_something() {
///     flytrap.capture_error(&e, None)?;
/// }
///
/// flytrap.shutdown().await;
/// ```
#[derive(Clone, Default)]
pub struct Flytrap {
	coordinator: Arc<CaptureCoordinator>,
}

impl Flytrap {
	/// Creates an uninitialized client. Call [`init`](Self::init) before
	/// capturing.
	pub fn new() -> Self {
		Self {
			coordinator: CaptureCoordinator::new(),
		}
	}

	/// Initializes the client. Fails if already initialized, unless `force`.
	///
	/// Must be called from within a tokio runtime. Installs the panic hook
	/// when `config.capture_panics` is set.
	pub fn init(&self, config: Config, force: bool) -> Result<Arc<Config>> {
		self.coordinator.init(config, force)
	}

	/// The active configuration.
	pub fn config(&self) -> Result<Arc<Config>> {
		self.coordinator.config()
	}

	/// Reports `exception` as handled. Always sends, even if a hook already
	/// reported the same exception.
	pub fn capture_exception(&self, exception: ExceptionRef, request: Option<RequestMetadata>) -> Result<ReportHandle> {
		self.coordinator.capture_exception(exception, request)
	}

	/// Reports any error as handled.
	///
	/// If a [`reqwest::Error`] with a URL is found in the error's source
	/// chain, that URL is attached as the request path.
	#[track_caller]
	pub fn capture_error<E>(&self, error: &E, request: Option<RequestMetadata>) -> Result<ReportHandle>
	where
		E: std::error::Error + 'static,
	{
		let mut exception = Exception::from_error(error);
		if let Some(url) = failed_request_url(error) {
			exception = exception.with_request(RequestMetadata {
				method: request.as_ref().and_then(|r| r.method.clone()),
				url: Some(url),
			});
		}
		self.capture_exception(exception.into_ref(), request)
	}

	/// Installs the panic hook if `init` did not. Returns false if already
	/// installed.
	pub fn install_panic_hook(&self) -> bool {
		self.coordinator.install_panic_hook()
	}

	/// Spawns `future`; an `Err` is reported as an unhandled rejection.
	pub fn spawn_supervised<F, T>(&self, future: F) -> Result<JoinHandle<Option<T>>>
	where
		F: Future<Output = std::result::Result<T, Rejection>> + Send + 'static,
		T: Send + 'static,
	{
		self.coordinator.spawn_supervised(future)
	}

	/// An error boundary reporting to this client, with the default fallback.
	pub fn error_boundary<V>(&self) -> ErrorBoundary<V>
	where
		V: Clone + From<&'static str>,
	{
		ErrorBoundary::new(self.coordinator.clone())
	}

	/// The coordinator behind this client, for wiring custom hooks.
	pub fn coordinator(&self) -> &Arc<CaptureCoordinator> {
		&self.coordinator
	}

	/// Waits for in-flight reports.
	pub async fn shutdown(&self) {
		self.coordinator.shutdown().await;
	}
}

fn failed_request_url(error: &(dyn std::error::Error + 'static)) -> Option<String> {
	let mut current = Some(error);
	while let Some(err) = current {
		if let Some(reqwest_err) = err.downcast_ref::<reqwest::Error>() {
			if let Some(url) = reqwest_err.url() {
				return Some(url.to_string());
			}
		}
		current = err.source();
	}
	None
}
