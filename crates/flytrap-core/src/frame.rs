// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Stack trace parsing.
//!
//! Understands the common textual frame layouts:
//!
//! ```text
//! Error: boom                                  <- header, always skipped
//!     at render (https://app.example/main.js:10:5)
//!     at https://app.example/vendor.js:2:17
//! onClick@https://app.example/main.js:44:9
//!              at ./src/handlers.rs:88:13      <- std::backtrace output
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Upper bound on parsed frames. Stack traces list the innermost call first,
/// so the cap keeps the frames closest to the failure.
pub const MAX_FRAMES: usize = 10;

// `[at] [function] (<file>:<line>:<column>)`. The file may contain `@`.
static PAREN_FRAME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*(?:at\s+)?.*?\((?P<file>[^()]+):(?P<line>\d+):(?P<column>\d+)\)\s*$").unwrap()
});

// `[at] [function@]<file>:<line>:<column>`. An `@` only ends a Gecko function
// name when the file after it starts with a scheme, `/` or `.`; otherwise it
// belongs to the file (`https://cdn.example/@scope/pkg@1.2.3/x.js`).
static BARE_FRAME: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(
		r"^\s*(?:at\s+)?(?:[^\s@]*@(?P<gecko_file>(?:[A-Za-z][\w+.-]*:|[/.])\S*?)|(?P<file>\S+?)):(?P<line>\d+):(?P<column>\d+)\s*$",
	)
	.unwrap()
});

/// A single source location from a stack trace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackFrame {
	pub file: String,
	/// 1-based line number.
	pub line: u32,
	/// 1-based column number.
	pub column: u32,
}

impl StackFrame {
	pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
		Self {
			file: file.into(),
			line,
			column,
		}
	}

	/// Parse a single frame line. Returns `None` for lines that carry no
	/// `<file>:<line>:<column>` location.
	pub fn parse_line(line: &str) -> Option<Self> {
		let caps = PAREN_FRAME.captures(line).or_else(|| BARE_FRAME.captures(line))?;
		let file = caps.name("gecko_file").or_else(|| caps.name("file"))?;
		Some(Self {
			file: file.as_str().to_string(),
			line: caps["line"].parse().ok()?,
			column: caps["column"].parse().ok()?,
		})
	}
}

/// Parse a raw stack trace into frames.
///
/// The first line is the error header and is skipped. Lines without a
/// location are dropped silently. Returns `None` when there is no stack at
/// all, and at most [`MAX_FRAMES`] frames otherwise.
pub fn parse_stack_trace(raw: Option<&str>) -> Option<Vec<StackFrame>> {
	let raw = raw.filter(|s| !s.is_empty())?;

	Some(
		raw.split('\n')
			.skip(1)
			.filter_map(StackFrame::parse_line)
			.take(MAX_FRAMES)
			.collect(),
	)
}
