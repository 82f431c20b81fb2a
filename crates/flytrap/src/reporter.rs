// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Assembles a [`LogRecord`] from a captured signal and submits it.

use std::sync::Arc;

use chrono::Utc;
use flytrap_core::{parse_stack_trace, CapturedSignal, CodeContext, ErrorData, LogRecord, RecordPayload, RequestMetadata};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::environment::{EnvironmentProbe, SystemProbe};
use crate::error::{FlytrapError, Result};
use crate::source::{HttpSourceFetcher, SourceContextResolver, SourceFetcher};
use crate::transport::{Delivery, HttpTransport, IngestRoute, Transport};

/// Result of one report. Reporting never fails into application code; a
/// failed submission is logged and surfaced here.
#[derive(Debug)]
pub enum ReportOutcome {
	Delivered {
		status: u16,
		message: Option<String>,
	},
	Failed(FlytrapError),
}

impl ReportOutcome {
	pub fn is_delivered(&self) -> bool {
		matches!(self, Self::Delivered { .. })
	}
}

impl From<Result<Delivery>> for ReportOutcome {
	fn from(result: Result<Delivery>) -> Self {
		match result {
			Ok(Delivery { status, message }) => Self::Delivered { status, message },
			Err(e) => Self::Failed(e),
		}
	}
}

/// The report pipeline for one configuration.
pub struct Reporter {
	config: Arc<Config>,
	transport: Arc<dyn Transport>,
	resolver: SourceContextResolver,
	probe: Arc<dyn EnvironmentProbe>,
}

impl Reporter {
	/// Builds the HTTP-backed pipeline for `config`.
	pub fn new(config: Arc<Config>) -> Result<Self> {
		let client = flytrap_common_http::client_with_timeout(config.request_timeout)?;
		let transport = HttpTransport::new(client.clone(), config.api_endpoint.clone(), config.api_key.clone());
		let fetcher = HttpSourceFetcher::new(client.clone());
		let probe = SystemProbe::new(client, config.ip_lookup_url.clone(), config.user_agent.clone());
		Ok(Self::with_parts(config, Arc::new(transport), Arc::new(fetcher), Arc::new(probe)))
	}

	/// Builds a pipeline from explicit parts.
	pub fn with_parts(
		config: Arc<Config>,
		transport: Arc<dyn Transport>,
		fetcher: Arc<dyn SourceFetcher>,
		probe: Arc<dyn EnvironmentProbe>,
	) -> Self {
		let resolver = SourceContextResolver::new(fetcher, config.context_lines);
		Self {
			config,
			transport,
			resolver,
			probe,
		}
	}

	pub fn config(&self) -> &Arc<Config> {
		&self.config
	}

	/// Builds and submits the record for `signal`.
	///
	/// Request metadata carried by the exception itself takes precedence over
	/// `request`.
	#[instrument(skip_all, fields(kind = signal.kind(), handled = handled))]
	pub async fn report(&self, signal: CapturedSignal, handled: bool, request: Option<RequestMetadata>) -> ReportOutcome {
		let record = self.assemble(signal, handled, request).await;
		let route = IngestRoute::for_record(&record);

		let outcome = ReportOutcome::from(self.transport.submit(route, &record).await);
		match &outcome {
			ReportOutcome::Delivered { status, .. } => {
				info!(route = %route, status, "[flytrap] Report sent");
			}
			ReportOutcome::Failed(e) => {
				warn!(route = %route, error = %e, "[flytrap] Failed to send report");
			}
		}
		outcome
	}

	/// Builds the record without submitting it.
	pub async fn assemble(&self, signal: CapturedSignal, handled: bool, request: Option<RequestMetadata>) -> LogRecord {
		let timestamp = Utc::now();

		let request = signal
			.exception()
			.and_then(|e| e.request().cloned())
			.or(request)
			.unwrap_or_default();

		let (code_contexts, ip) = tokio::join!(self.code_contexts(&signal), self.probe.public_ip());
		let env = self.probe.browser_and_os();

		let (payload, component_stack) = match signal {
			CapturedSignal::NativeError(error) => (
				RecordPayload::Error {
					error: ErrorData::from(&*error),
				},
				None,
			),
			CapturedSignal::RenderError { error, component_stack } => (
				RecordPayload::Error {
					error: ErrorData::from(&*error),
				},
				component_stack,
			),
			CapturedSignal::RejectedValue(value) => (RecordPayload::Rejection { value }, None),
		};

		let mut record = LogRecord::new(payload, handled, self.config.project_id.clone(), timestamp);
		record.code_contexts = code_contexts;
		record.method = request.method;
		record.path = request.url;
		record.ip = ip;
		record.os = env.os;
		record.browser = env.browser;
		record.component_stack = component_stack;
		record
	}

	async fn code_contexts(&self, signal: &CapturedSignal) -> Vec<CodeContext> {
		if !self.config.include_context {
			return Vec::new();
		}
		let Some(exception) = signal.exception() else {
			return Vec::new();
		};
		match parse_stack_trace(exception.stack()) {
			Some(frames) => self.resolver.resolve_all(&frames).await,
			None => {
				debug!("No parseable stack, skipping code contexts");
				Vec::new()
			}
		}
	}
}
