// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flytrap error-monitoring SDK for Rust applications.
//!
//! This crate captures failures and reports them to the Flytrap ingestion API:
//!
//! - **Panics** via a panic hook (the uncaught errors of a Rust program)
//! - **Unhandled rejections** from tasks started with
//!   [`Flytrap::spawn_supervised`] that finish with `Err`
//! - **Render errors** trapped by an [`ErrorBoundary`]
//! - **Manual capture** with [`Flytrap::capture_exception`] and
//!   [`Flytrap::capture_error`]
//!
//! Each report carries the parsed stack, source snippets around each frame
//! (when `include_context` is set), the public IP, OS and browser.
//!
//! # Example
//!
//! ```ignore
//! use flytrap::{Config, Flytrap};
//!
//! #[tokio::main]
//! async fn main() -> flytrap::Result<()> {
//!     let flytrap = Flytrap::new();
//!     flytrap.init(Config::from_env()?, false)?;
//!
//!     if let Err(e) = std::fs::read_to_string("settings.toml") {
//!         flytrap.capture_error(&e, None)?;
//!     }
//!
//!     flytrap.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod boundary;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod dedup;
pub mod environment;
pub mod error;
mod panic_hook;
pub mod reporter;
pub mod source;
pub mod transport;

pub use boundary::{BoundaryState, ErrorBoundary, RenderErrorSink, RenderFault, DEFAULT_FALLBACK};
pub use client::Flytrap;
pub use config::{Config, ConfigBuilder, ConfigStore, DEFAULT_IP_LOOKUP_URL};
pub use coordinator::{CaptureCoordinator, Rejection, ReportHandle};
pub use dedup::DedupRegistry;
pub use environment::{BrowserOs, EnvironmentProbe, SystemProbe};
pub use error::{FlytrapError, Result};
pub use reporter::{ReportOutcome, Reporter};
pub use source::{HttpSourceFetcher, SourceContextResolver, SourceFetcher};
pub use transport::{Delivery, HttpTransport, IngestRoute, Transport};

pub use flytrap_core::{
	CapturedSignal, CodeContext, Exception, ExceptionRef, LogRecord, Origin, RejectionValue, RequestMetadata,
	StackFrame,
};
