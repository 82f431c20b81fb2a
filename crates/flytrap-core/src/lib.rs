// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Flytrap error-monitoring SDK.
//!
//! Everything in this crate is pure: no I/O, no global state. The SDK crate
//! (`flytrap`) builds the capture pipeline on top of these pieces:
//!
//! - [`Exception`]: the error object flowing through the pipeline, shared as
//!   [`ExceptionRef`] so that its identity can be tracked
//! - [`parse_stack_trace`]: raw stack text to [`StackFrame`]s
//! - [`context_window`]: source text to a snippet around a line
//! - [`CapturedSignal`] and [`LogRecord`]: what comes in and what goes out

pub mod context;
pub mod exception;
pub mod frame;
pub mod record;

pub use context::{context_window, CodeContext, DEFAULT_CONTEXT_LINES};
pub use exception::{Exception, ExceptionRef, Origin, RequestMetadata};
pub use frame::{parse_stack_trace, StackFrame, MAX_FRAMES};
pub use record::{CapturedSignal, ErrorData, LogRecord, RecordPayload, RejectionValue};
