// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Example: report errors with the Flytrap SDK.
//!
//! Run with:
//!   FLYTRAP_PROJECT_ID=... FLYTRAP_API_ENDPOINT=... FLYTRAP_API_KEY=... \
//!     cargo run --example capture -p flytrap

use flytrap::{Config, Flytrap, Rejection, RenderFault, ReportOutcome};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "flytrap=debug".into()),
		)
		.init();

	let config = Config::from_env()?;
	println!("Initializing Flytrap...");
	println!("  Endpoint: {}", config.api_endpoint);
	println!("  Project ID: {}", config.project_id);

	let flytrap = Flytrap::new();
	flytrap.init(config, false)?;

	// Manual capture of a handled error
	println!("\nCapturing a handled error...");
	let io_error = std::fs::read_to_string("/definitely/missing/settings.toml").unwrap_err();
	match flytrap.capture_error(&io_error, None)?.outcome().await {
		ReportOutcome::Delivered { status, message } => {
			println!("  Delivered (status {status}): {}", message.unwrap_or_default());
		}
		ReportOutcome::Failed(e) => println!("  Not delivered: {e}"),
	}

	// A background task that fails with a plain value
	println!("\nRunning a supervised task that rejects...");
	let task = flytrap.spawn_supervised(async { Err::<(), _>(Rejection::value(json!({"code": 42}))) })?;
	task.await?;

	// A component tree that fails to render
	println!("\nRendering a failing component...");
	let mut boundary = flytrap.error_boundary::<String>();
	let view = boundary.render(|| {
		Err(RenderFault::from(flytrap::Exception::capture("RenderError", "missing prop `title`"))
			.with_component_stack("in Header\nin App"))
	});
	println!("  Boundary shows: {view}");

	flytrap.shutdown().await;
	println!("\nAll reports flushed.");

	Ok(())
}
