// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entry points for failure signals and dispatch into the report pipeline.
//!
//! Automatic hooks (panics, supervised tasks, error boundaries) report with
//! `handled = false`. Panics and supervised tasks skip errors that were
//! already reported; error boundaries always report and mark the error seen.
//! Manual capture reports with `handled = true` and always sends.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use flytrap_core::{CapturedSignal, Exception, ExceptionRef, RejectionValue, RequestMetadata};
use parking_lot::RwLock;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::boundary::RenderErrorSink;
use crate::config::{Config, ConfigStore};
use crate::dedup::DedupRegistry;
use crate::error::{FlytrapError, Result};
use crate::panic_hook;
use crate::reporter::{ReportOutcome, Reporter};

/// Why a supervised task failed.
#[derive(Debug, Clone)]
pub enum Rejection {
	/// Failed with an error; reported to `/api/errors`.
	Error(ExceptionRef),
	/// Failed with a plain value; reported to `/api/rejections`.
	Value(RejectionValue),
}

impl Rejection {
	/// Rejects with `error`, recording the caller as the innermost frame.
	#[track_caller]
	pub fn error<E>(error: &E) -> Self
	where
		E: std::error::Error + ?Sized,
	{
		Self::Error(Exception::from_error(error).into_ref())
	}

	pub fn value(value: impl Into<RejectionValue>) -> Self {
		Self::Value(value.into())
	}
}

impl From<ExceptionRef> for Rejection {
	fn from(error: ExceptionRef) -> Self {
		Self::Error(error)
	}
}

impl From<Exception> for Rejection {
	fn from(error: Exception) -> Self {
		Self::Error(error.into_ref())
	}
}

impl From<RejectionValue> for Rejection {
	fn from(value: RejectionValue) -> Self {
		Self::Value(value)
	}
}

impl From<&str> for Rejection {
	fn from(value: &str) -> Self {
		Self::Value(RejectionValue::from(value))
	}
}

impl From<String> for Rejection {
	fn from(value: String) -> Self {
		Self::Value(RejectionValue::from(value))
	}
}

/// Completion signal for one in-flight report.
///
/// Dropping the handle does not cancel the report.
#[derive(Debug)]
pub struct ReportHandle {
	task: JoinHandle<ReportOutcome>,
}

impl ReportHandle {
	/// Waits for the report to finish.
	pub async fn outcome(self) -> ReportOutcome {
		match self.task.await {
			Ok(outcome) => outcome,
			Err(e) => ReportOutcome::Failed(FlytrapError::TaskFailed(e.to_string())),
		}
	}

	pub fn is_finished(&self) -> bool {
		self.task.is_finished()
	}
}

#[derive(Clone)]
struct Pipeline {
	reporter: Arc<Reporter>,
	runtime: Handle,
}

/// Receives failure signals and drives them through the pipeline.
///
/// Owns the state that would otherwise be process-global: the config store,
/// the dedup registry and the "panic hook installed" guard.
pub struct CaptureCoordinator {
	store: ConfigStore,
	pipeline: RwLock<Option<Pipeline>>,
	dedup: DedupRegistry,
	tracker: TaskTracker,
	panic_hook_installed: AtomicBool,
}

impl Default for CaptureCoordinator {
	fn default() -> Self {
		Self {
			store: ConfigStore::new(),
			pipeline: RwLock::new(None),
			dedup: DedupRegistry::new(),
			tracker: TaskTracker::new(),
			panic_hook_installed: AtomicBool::new(false),
		}
	}
}

impl CaptureCoordinator {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Stores `config` and builds the HTTP pipeline.
	///
	/// Must be called from within a tokio runtime; reports are spawned on it.
	pub fn init(self: &Arc<Self>, config: Config, force: bool) -> Result<Arc<Config>> {
		self.init_with(config, force, Reporter::new)
	}

	/// Like [`init`](Self::init) with a caller-supplied reporter.
	pub fn init_with<F>(self: &Arc<Self>, config: Config, force: bool, build: F) -> Result<Arc<Config>>
	where
		F: FnOnce(Arc<Config>) -> Result<Reporter>,
	{
		let runtime = Handle::try_current().map_err(|_| FlytrapError::NoRuntime)?;
		let config = self.store.init(config, force)?;
		let reporter = build(Arc::clone(&config))?;

		*self.pipeline.write() = Some(Pipeline {
			reporter: Arc::new(reporter),
			runtime,
		});

		if config.capture_panics {
			self.install_panic_hook();
		}
		Ok(config)
	}

	pub fn config(&self) -> Result<Arc<Config>> {
		self.store.get()
	}

	/// Installs the process-wide panic hook. Returns false if this
	/// coordinator already installed it.
	pub fn install_panic_hook(self: &Arc<Self>) -> bool {
		if self.panic_hook_installed.swap(true, Ordering::SeqCst) {
			debug!("Panic hook already installed");
			return false;
		}
		panic_hook::install(Arc::downgrade(self));
		info!("Panic hook installed");
		true
	}

	/// Reports `error` with `handled = true`, bypassing dedup.
	pub fn capture_exception(&self, error: ExceptionRef, request: Option<RequestMetadata>) -> Result<ReportHandle> {
		let pipeline = self.pipeline()?;
		Ok(self.spawn_report(pipeline, CapturedSignal::NativeError(error), true, request))
	}

	/// Hook for errors nothing else handled (panics).
	pub fn on_uncaught_error(&self, error: ExceptionRef) -> Option<ReportHandle> {
		self.dispatch_automatic(CapturedSignal::NativeError(error))
	}

	/// Hook for supervised tasks that returned `Err`.
	pub fn on_unhandled_rejection(&self, rejection: Rejection) -> Option<ReportHandle> {
		let signal = match rejection {
			Rejection::Error(error) => CapturedSignal::NativeError(error),
			Rejection::Value(value) => CapturedSignal::RejectedValue(value),
		};
		self.dispatch_automatic(signal)
	}

	/// Hook for errors caught by an [`ErrorBoundary`](crate::ErrorBoundary).
	///
	/// Always reports, even when another hook already sent the same error,
	/// and marks the error seen so the other hooks skip it afterwards.
	pub fn on_render_error(&self, error: ExceptionRef, component_stack: Option<String>) -> Option<ReportHandle> {
		let pipeline = match self.pipeline() {
			Ok(pipeline) => pipeline,
			Err(e) => {
				warn!(kind = "render_error", error = %e, "[flytrap] Dropping signal");
				return None;
			}
		};
		self.dedup.mark_seen(&error);
		Some(self.spawn_report(pipeline, CapturedSignal::RenderError { error, component_stack }, false, None))
	}

	/// Runs `future` on the SDK runtime. An `Err` result is reported as an
	/// unhandled rejection and the handle resolves to `None`.
	pub fn spawn_supervised<F, T>(self: &Arc<Self>, future: F) -> Result<JoinHandle<Option<T>>>
	where
		F: Future<Output = std::result::Result<T, Rejection>> + Send + 'static,
		T: Send + 'static,
	{
		let runtime = self.pipeline()?.runtime;
		let coordinator = Arc::downgrade(self);

		Ok(runtime.spawn(async move {
			match future.await {
				Ok(value) => Some(value),
				Err(rejection) => {
					if let Some(coordinator) = coordinator.upgrade() {
						coordinator.on_unhandled_rejection(rejection);
					}
					None
				}
			}
		}))
	}

	/// Waits for every in-flight report to finish.
	pub async fn shutdown(&self) {
		self.tracker.close();
		info!(in_flight = self.tracker.len(), "Waiting for in-flight reports");
		self.tracker.wait().await;
		self.tracker.reopen();
	}

	/// Number of reports still running.
	pub fn in_flight(&self) -> usize {
		self.tracker.len()
	}

	/// Reports an uncaught error synchronously, bounded by the panic flush
	/// timeout.
	///
	/// The report runs on its own thread and current-thread runtime: the
	/// caller may be a worker of a runtime that is unwinding and will not be
	/// polled again.
	pub(crate) fn report_uncaught_blocking(&self, error: ExceptionRef) -> Option<ReportOutcome> {
		let signal = CapturedSignal::NativeError(error);
		let pipeline = self.admit_automatic(&signal)?;
		let reporter = pipeline.reporter;
		let timeout = reporter.config().panic_flush_timeout;

		let worker = std::thread::Builder::new()
			.name(panic_hook::REPORT_THREAD_NAME.to_string())
			.spawn(move || -> Result<ReportOutcome> {
				let runtime = tokio::runtime::Builder::new_current_thread()
					.enable_all()
					.build()
					.map_err(|e| FlytrapError::TaskFailed(e.to_string()))?;
				let outcome = runtime.block_on(tokio::time::timeout(timeout, reporter.report(signal, false, None)));
				runtime.shutdown_background();
				outcome.map_err(|_| FlytrapError::TaskFailed(format!("panic report timed out after {timeout:?}")))
			});

		let outcome = match worker {
			Ok(worker) => match worker.join() {
				Ok(Ok(outcome)) => outcome,
				Ok(Err(e)) => ReportOutcome::Failed(e),
				Err(_) => ReportOutcome::Failed(FlytrapError::TaskFailed("panic report thread panicked".into())),
			},
			Err(e) => ReportOutcome::Failed(FlytrapError::TaskFailed(e.to_string())),
		};

		if let ReportOutcome::Failed(FlytrapError::TaskFailed(reason)) = &outcome {
			warn!(timeout_ms = timeout.as_millis() as u64, reason = %reason, "[flytrap] Panic report did not finish");
		}
		Some(outcome)
	}

	fn pipeline(&self) -> Result<Pipeline> {
		self.pipeline.read().clone().ok_or(FlytrapError::NotInitialized)
	}

	fn dispatch_automatic(&self, signal: CapturedSignal) -> Option<ReportHandle> {
		let pipeline = self.admit_automatic(&signal)?;
		Some(self.spawn_report(pipeline, signal, false, None))
	}

	/// The pipeline to report `signal` on, or `None` when the SDK is not
	/// initialized, the error came from the SDK or was already reported.
	fn admit_automatic(&self, signal: &CapturedSignal) -> Option<Pipeline> {
		let pipeline = match self.pipeline() {
			Ok(pipeline) => pipeline,
			Err(e) => {
				warn!(kind = signal.kind(), error = %e, "[flytrap] Dropping signal");
				return None;
			}
		};

		if let Some(error) = signal.exception() {
			if error.is_internal() {
				debug!(kind = signal.kind(), "Ignoring error raised by the SDK");
				return None;
			}
			if !self.dedup.mark_if_new(error) {
				debug!(kind = signal.kind(), "Error already reported");
				return None;
			}
		}
		Some(pipeline)
	}

	fn spawn_report(
		&self,
		pipeline: Pipeline,
		signal: CapturedSignal,
		handled: bool,
		request: Option<RequestMetadata>,
	) -> ReportHandle {
		debug!(kind = signal.kind(), handled, "Dispatching report");
		let reporter = pipeline.reporter;
		let task = self
			.tracker
			.track_future(async move { reporter.report(signal, handled, request).await });
		ReportHandle {
			task: pipeline.runtime.spawn(task),
		}
	}
}

impl RenderErrorSink for CaptureCoordinator {
	fn render_failed(&self, error: ExceptionRef, component_stack: Option<String>) {
		self.on_render_error(error, component_stack);
	}
}
