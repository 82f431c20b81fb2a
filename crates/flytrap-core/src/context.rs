// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Source snippets around stack frame locations.

use serde::{Deserialize, Serialize};

use crate::frame::StackFrame;

/// Lines captured on each side of the failing line.
pub const DEFAULT_CONTEXT_LINES: usize = 5;

/// Source snippet attached to a resolved stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeContext {
	pub file: String,
	pub line: u32,
	pub column: u32,
	pub context: String,
}

impl CodeContext {
	/// Build the context for `frame` from the fetched `source`.
	pub fn from_source(frame: &StackFrame, source: &str, radius: usize) -> Self {
		Self {
			file: frame.file.clone(),
			line: frame.line,
			column: frame.column,
			context: context_window(source, frame.line as usize, radius),
		}
	}
}

/// Slice the lines around 1-based `line` out of `source`.
///
/// Returns lines `[line - radius - 1, line + radius)` clamped to the text and
/// joined with `\n`; an out-of-range line yields an empty string.
pub fn context_window(source: &str, line: usize, radius: usize) -> String {
	let lines: Vec<&str> = source.split('\n').collect();
	let start = line.saturating_sub(radius + 1);
	let end = line.saturating_add(radius).min(lines.len());

	if start >= end {
		return String::new();
	}

	lines[start..end].join("\n")
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn numbered(n: usize) -> String {
		(1..=n).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
	}

	#[test]
	fn window_is_symmetric_in_the_middle() {
		let source = numbered(20);
		let window = context_window(&source, 10, 5);
		let lines: Vec<&str> = window.split('\n').collect();
		assert_eq!(lines.first(), Some(&"line 5"));
		assert_eq!(lines.last(), Some(&"line 15"));
		assert_eq!(lines.len(), 11);
	}

	#[test]
	fn window_clamps_at_start() {
		let source = numbered(20);
		assert_eq!(context_window(&source, 1, 2), "line 1\nline 2\nline 3");
	}

	#[test]
	fn window_clamps_at_end() {
		let source = numbered(3);
		assert_eq!(context_window(&source, 3, 2), "line 1\nline 2\nline 3");
	}

	#[test]
	fn line_beyond_source_is_empty() {
		assert_eq!(context_window("a\nb", 50, 5), "");
	}

	#[test]
	fn zero_radius_is_just_the_line() {
		assert_eq!(context_window(&numbered(5), 3, 0), "line 3");
	}

	#[test]
	fn code_context_copies_frame_location() {
		let frame = StackFrame::new("/srv/app.js", 2, 7);
		let ctx = CodeContext::from_source(&frame, "a\nb\nc", 1);
		assert_eq!(ctx.file, "/srv/app.js");
		assert_eq!(ctx.line, 2);
		assert_eq!(ctx.column, 7);
		assert_eq!(ctx.context, "a\nb\nc");
	}

	proptest! {
		#[test]
		fn window_never_exceeds_two_radius_plus_one(
			total in 1usize..200,
			line in 1usize..250,
			radius in 0usize..20,
		) {
			let source = numbered(total);
			let window = context_window(&source, line, radius);
			let count = if window.is_empty() { 0 } else { window.split('\n').count() };
			prop_assert!(count <= 2 * radius + 1);
			if line <= total {
				let needle = format!("line {line}");
				prop_assert!(window.contains(&needle));
			}
		}
	}
}
