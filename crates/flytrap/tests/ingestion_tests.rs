// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end tests against a mock ingestion API.
//!
//! Tests cover:
//! - Manual capture posting to `/api/errors`
//! - Supervised task rejections posting to `/api/rejections`
//! - Dedup across hooks with manual capture bypassing it
//! - Source context and IP lookup through real HTTP fetches
//! - Error boundaries reporting render errors once
//! - Init/re-init rules
//! - Swallowed transport failures

use std::sync::Arc;

use flytrap::{
	Config, ConfigBuilder, ErrorBoundary, Exception, Flytrap, FlytrapError, Rejection, RenderFault, ReportOutcome,
	DEFAULT_FALLBACK,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ok_response() -> ResponseTemplate {
	ResponseTemplate::new(200).set_body_json(json!({"status": 200, "data": {"message": "Log saved"}}))
}

fn base_config(server: &MockServer) -> ConfigBuilder {
	Config::builder()
		.project_id("p1")
		.api_endpoint(server.uri())
		.api_key("k")
		.capture_panics(false)
		.disable_ip_lookup()
}

async fn posted_records(server: &MockServer, route: &str) -> Vec<Value> {
	server
		.received_requests()
		.await
		.unwrap_or_default()
		.into_iter()
		.filter(|r| r.method.as_str() == "POST" && r.url.path() == route)
		.map(|r| r.body_json::<Value>().unwrap()["data"].clone())
		.collect()
}

#[tokio::test]
async fn manual_capture_posts_one_handled_error() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/errors"))
		.and(header("x-api-key", "k"))
		.and(body_partial_json(json!({
			"data": {"handled": true, "project_id": "p1", "error": {"message": "boom"}}
		})))
		.respond_with(ok_response())
		.expect(1)
		.mount(&server)
		.await;

	let flytrap = Flytrap::new();
	flytrap
		.init(base_config(&server).include_context(false).build().unwrap(), false)
		.unwrap();

	let outcome = flytrap
		.capture_exception(Exception::new("Error", "boom").into_ref(), None)
		.unwrap()
		.outcome()
		.await;

	match outcome {
		ReportOutcome::Delivered { status, message } => {
			assert_eq!(status, 200);
			assert_eq!(message.as_deref(), Some("Log saved"));
		}
		ReportOutcome::Failed(e) => panic!("expected delivery, got {e}"),
	}

	let records = posted_records(&server, "/api/errors").await;
	assert_eq!(records[0]["codeContexts"], json!([]));
	assert!(records[0].get("value").is_none());
}

#[tokio::test]
async fn unhandled_rejection_posts_value() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/rejections"))
		.and(header("x-api-key", "k"))
		.and(body_partial_json(json!({"data": {"value": "oops", "handled": false}})))
		.respond_with(ok_response())
		.expect(1)
		.mount(&server)
		.await;

	let flytrap = Flytrap::new();
	flytrap.init(base_config(&server).build().unwrap(), false).unwrap();

	let task = flytrap
		.spawn_supervised(async { Err::<(), _>(Rejection::from("oops")) })
		.unwrap();
	assert_eq!(task.await.unwrap(), None);
	flytrap.shutdown().await;

	let records = posted_records(&server, "/api/rejections").await;
	assert_eq!(records.len(), 1);
	assert!(records[0].get("error").is_none());
}

#[tokio::test]
async fn hooks_dedup_but_manual_capture_always_sends() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/errors"))
		.respond_with(ok_response())
		.expect(2)
		.mount(&server)
		.await;

	let flytrap = Flytrap::new();
	flytrap.init(base_config(&server).build().unwrap(), false).unwrap();

	let error = Exception::new("Error", "seen twice").into_ref();
	let coordinator = flytrap.coordinator();
	assert!(coordinator.on_uncaught_error(Arc::clone(&error)).is_some());
	assert!(coordinator.on_uncaught_error(Arc::clone(&error)).is_none());
	flytrap.capture_exception(Arc::clone(&error), None).unwrap();
	flytrap.shutdown().await;

	let records = posted_records(&server, "/api/errors").await;
	let handled: Vec<bool> = records.iter().map(|r| r["handled"].as_bool().unwrap()).collect();
	assert_eq!(handled.iter().filter(|h| **h).count(), 1);
	assert_eq!(handled.iter().filter(|h| !**h).count(), 1);
}

#[tokio::test]
async fn error_report_includes_source_context_and_ip() {
	let server = MockServer::start().await;
	let source = (1..=20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
	Mock::given(method("GET"))
		.and(path("/static/app.js"))
		.respond_with(ResponseTemplate::new(200).set_body_string(source))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/static/gone.js"))
		.respond_with(ResponseTemplate::new(404))
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/ip"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"ip": "203.0.113.9"})))
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/api/errors"))
		.respond_with(ok_response())
		.mount(&server)
		.await;

	let flytrap = Flytrap::new();
	flytrap
		.init(
			base_config(&server)
				.ip_lookup_url(format!("{}/ip", server.uri()))
				.user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
				.build()
				.unwrap(),
			false,
		)
		.unwrap();

	let stack = format!(
		"TypeError: x is undefined\n    at render ({uri}/static/app.js:10:7)\n    at load ({uri}/static/gone.js:4:1)",
		uri = server.uri()
	);
	let error = Exception::new("TypeError", "x is undefined").with_stack(stack).into_ref();
	assert!(flytrap.capture_exception(error, None).unwrap().outcome().await.is_delivered());

	let records = posted_records(&server, "/api/errors").await;
	let record = &records[0];
	let contexts = record["codeContexts"].as_array().unwrap();
	assert_eq!(contexts.len(), 1);
	assert_eq!(contexts[0]["file"], json!(format!("{}/static/app.js", server.uri())));
	assert_eq!(contexts[0]["line"], json!(10));
	assert_eq!(contexts[0]["column"], json!(7));
	assert!(contexts[0]["context"].as_str().unwrap().starts_with("line 5\n"));
	assert_eq!(record["ip"], json!("203.0.113.9"));
	assert_eq!(record["browser"], json!("Chrome 120.0.0.0"));
	assert_eq!(record["os"], json!("Windows 10"));
}

#[tokio::test]
async fn init_twice_requires_force() {
	let server = MockServer::start().await;
	let flytrap = Flytrap::new();
	flytrap.init(base_config(&server).build().unwrap(), false).unwrap();

	let again = flytrap.init(base_config(&server).project_id("p2").build().unwrap(), false);
	assert!(matches!(again, Err(FlytrapError::AlreadyInitialized)));
	assert_eq!(flytrap.config().unwrap().project_id, "p1");

	flytrap
		.init(base_config(&server).project_id("p2").build().unwrap(), true)
		.unwrap();
	assert_eq!(flytrap.config().unwrap().project_id, "p2");
}

#[tokio::test]
async fn transport_failures_never_reach_the_caller() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/errors"))
		.respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
		.expect(1)
		.mount(&server)
		.await;

	let flytrap = Flytrap::new();
	flytrap.init(base_config(&server).build().unwrap(), false).unwrap();

	let handle = flytrap
		.capture_exception(Exception::new("Error", "boom").into_ref(), None)
		.unwrap();
	match handle.outcome().await {
		ReportOutcome::Failed(FlytrapError::ServerError { status, .. }) => assert_eq!(status, 500),
		other => panic!("expected server error, got {other:?}"),
	}
}

#[tokio::test]
async fn capture_error_attaches_failed_request_url() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/errors"))
		.respond_with(ok_response())
		.mount(&server)
		.await;

	let flytrap = Flytrap::new();
	flytrap.init(base_config(&server).build().unwrap(), false).unwrap();

	let error = reqwest::Client::new()
		.get("http://127.0.0.1:9/orders")
		.send()
		.await
		.unwrap_err();
	flytrap
		.capture_error(&error, Some(flytrap::RequestMetadata::new("GET", "https://ignored.example")))
		.unwrap()
		.outcome()
		.await;

	let records = posted_records(&server, "/api/errors").await;
	assert_eq!(records[0]["method"], json!("GET"));
	assert_eq!(records[0]["path"], json!("http://127.0.0.1:9/orders"));
	assert_eq!(records[0]["error"]["name"], json!("reqwest::Error"));
	assert_eq!(records[0]["handled"], json!(true));
}

#[tokio::test]
async fn boundary_posts_render_error_once_and_suppresses_uncaught_hook() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/api/errors"))
		.and(body_partial_json(json!({
			"data": {"handled": false, "componentStack": "in Header\nin App", "error": {"message": "render failed"}}
		})))
		.respond_with(ok_response())
		.expect(1)
		.mount(&server)
		.await;

	let flytrap = Flytrap::new();
	flytrap
		.init(base_config(&server).include_context(false).build().unwrap(), false)
		.unwrap();

	let error = Exception::new("Error", "render failed").into_ref();
	let mut boundary: ErrorBoundary<String> = flytrap.error_boundary();
	let fault = RenderFault::new(Arc::clone(&error)).with_component_stack("in Header\nin App");

	assert_eq!(boundary.render(|| Err(fault)), DEFAULT_FALLBACK);
	assert_eq!(boundary.render(|| Ok("<App/>".to_string())), DEFAULT_FALLBACK);
	assert!(flytrap.coordinator().on_uncaught_error(error).is_none());
	flytrap.shutdown().await;

	assert_eq!(posted_records(&server, "/api/errors").await.len(), 1);
}
