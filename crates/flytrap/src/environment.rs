// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Host environment details attached to every report: public IP, OS and
//! browser.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Browser and operating system, each formatted as `"<name> <version>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserOs {
	pub browser: Option<String>,
	pub os: Option<String>,
}

/// Source of environment metadata for reports.
///
/// Failures are not errors: an unavailable field is simply `None`.
#[async_trait]
pub trait EnvironmentProbe: Send + Sync {
	fn browser_and_os(&self) -> BrowserOs;

	async fn public_ip(&self) -> Option<String>;
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
	ip: String,
}

/// Probe backed by an IP echo service and an optional user-agent string.
#[derive(Debug, Clone)]
pub struct SystemProbe {
	client: Client,
	ip_lookup_url: Option<String>,
	user_agent: Option<String>,
}

impl SystemProbe {
	pub fn new(client: Client, ip_lookup_url: Option<String>, user_agent: Option<String>) -> Self {
		Self {
			client,
			ip_lookup_url,
			user_agent,
		}
	}
}

#[async_trait]
impl EnvironmentProbe for SystemProbe {
	fn browser_and_os(&self) -> BrowserOs {
		match &self.user_agent {
			Some(ua) => parse_user_agent(ua),
			None => BrowserOs {
				browser: None,
				os: Some(host_os()),
			},
		}
	}

	async fn public_ip(&self) -> Option<String> {
		let url = self.ip_lookup_url.as_deref()?;

		let response = match self.client.get(url).send().await {
			Ok(response) => response,
			Err(e) => {
				warn!(error = %e, "[flytrap] Failed to fetch public IP");
				return None;
			}
		};
		if !response.status().is_success() {
			warn!(status = %response.status(), "[flytrap] IP lookup returned an error status");
			return None;
		}

		match response.json::<IpLookupResponse>().await {
			Ok(body) => Some(body.ip),
			Err(e) => {
				warn!(error = %e, "[flytrap] IP lookup returned an unexpected body");
				None
			}
		}
	}
}

/// OS of the running process, e.g. `"Linux x86_64"`.
pub fn host_os() -> String {
	let name = match std::env::consts::OS {
		"linux" => "Linux",
		"macos" => "Mac OS",
		"windows" => "Windows",
		"ios" => "iOS",
		"android" => "Android",
		"freebsd" => "FreeBSD",
		other => other,
	};
	format!("{name} {}", std::env::consts::ARCH)
}

static EDGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:Edg|Edge|EdgA|EdgiOS)/([\d.]+)").unwrap());
static OPERA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:OPR|Opera)/([\d.]+)").unwrap());
static FIREFOX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:Firefox|FxiOS)/([\d.]+)").unwrap());
static CHROME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(?:Chrome|CriOS)/([\d.]+)").unwrap());
static SAFARI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bVersion/([\d.]+).*\bSafari/").unwrap());

static WINDOWS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Windows NT ([\d.]+)").unwrap());
static IOS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:iPhone|CPU) OS ([\d_]+)").unwrap());
static MAC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Mac OS X ([\d_.]+)").unwrap());
static ANDROID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Android ([\d.]+)").unwrap());

/// Extracts browser and OS from a user-agent string.
pub fn parse_user_agent(ua: &str) -> BrowserOs {
	BrowserOs {
		browser: parse_browser(ua),
		os: parse_os(ua),
	}
}

fn capture(re: &Regex, ua: &str) -> Option<String> {
	re.captures(ua).map(|c| c[1].to_string())
}

fn parse_browser(ua: &str) -> Option<String> {
	let (name, version) = if let Some(v) = capture(&EDGE, ua) {
		("Edge", v)
	} else if let Some(v) = capture(&OPERA, ua) {
		("Opera", v)
	} else if let Some(v) = capture(&FIREFOX, ua) {
		("Firefox", v)
	} else if let Some(v) = capture(&CHROME, ua) {
		("Chrome", v)
	} else if let Some(v) = capture(&SAFARI, ua) {
		("Safari", v)
	} else {
		debug!(user_agent = %ua, "Unrecognised browser");
		return None;
	};
	Some(format!("{name} {version}"))
}

fn parse_os(ua: &str) -> Option<String> {
	if let Some(nt) = capture(&WINDOWS, ua) {
		let release = match nt.as_str() {
			"10.0" => "10",
			"6.3" => "8.1",
			"6.2" => "8",
			"6.1" => "7",
			"6.0" => "Vista",
			"5.1" | "5.2" => "XP",
			other => other,
		};
		return Some(format!("Windows {release}"));
	}
	if let Some(v) = capture(&IOS, ua) {
		return Some(format!("iOS {}", v.replace('_', ".")));
	}
	if let Some(v) = capture(&MAC, ua) {
		return Some(format!("Mac OS {}", v.replace('_', ".")));
	}
	if let Some(v) = capture(&ANDROID, ua) {
		return Some(format!("Android {v}"));
	}
	if ua.contains("CrOS") {
		return Some("Chrome OS".to_string());
	}
	if ua.contains("Linux") {
		return Some("Linux".to_string());
	}
	None
}
