// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Panic hook integration: panics are the uncaught errors of a Rust program.

use std::any::Any;
use std::backtrace::Backtrace;
use std::panic::{Location, PanicHookInfo};
use std::sync::{Arc, Weak};

use flytrap_core::{Exception, ExceptionRef};

use crate::coordinator::CaptureCoordinator;
use crate::error::FlytrapError;

/// Name of the thread that delivers panic reports. Panics on it are not
/// reported.
pub(crate) const REPORT_THREAD_NAME: &str = "flytrap-panic-report";

/// Install a panic hook that forwards panics to `coordinator`, then runs the
/// previously installed hook.
pub(crate) fn install(coordinator: Weak<CaptureCoordinator>) {
	let previous_hook = std::panic::take_hook();

	std::panic::set_hook(Box::new(move |info| {
		if let Some(coordinator) = coordinator.upgrade() {
			report_panic(&coordinator, info);
		}
		previous_hook(info);
	}));
}

fn report_panic(coordinator: &CaptureCoordinator, info: &PanicHookInfo<'_>) {
	if std::thread::current().name() == Some(REPORT_THREAD_NAME) {
		return;
	}
	let Some(exception) = exception_for_panic(info.payload(), info.location()) else {
		return;
	};
	// Blocks until the report is delivered or the flush timeout elapses.
	coordinator.report_uncaught_blocking(exception);
}

/// Exception to report for a panic payload, or `None` for panics raised by
/// the SDK itself.
///
/// `std::panic::panic_any(exception_ref)` keeps the exception's identity so
/// it is deduplicated against other hooks.
pub(crate) fn exception_for_panic(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> Option<ExceptionRef> {
	if payload.is::<FlytrapError>() {
		return None;
	}
	if let Some(exception) = payload.downcast_ref::<ExceptionRef>() {
		return Some(Arc::clone(exception));
	}

	let backtrace = Backtrace::force_capture();
	Some(Exception::from_panic(panic_message(payload), location, &backtrace).into_ref())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		s.to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else if let Some(exception) = payload.downcast_ref::<Exception>() {
		exception.to_string()
	} else {
		"Box<dyn Any>".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use flytrap_core::parse_stack_trace;

	#[test]
	fn str_and_string_payloads_become_panic_exceptions() {
		let location = Location::caller();

		let from_str = exception_for_panic(&"index out of bounds", Some(location)).unwrap();
		assert_eq!(from_str.name(), "panic");
		assert_eq!(from_str.message(), "index out of bounds");

		let from_string = exception_for_panic(&String::from("bad state"), None).unwrap();
		assert_eq!(from_string.message(), "bad state");
	}

	#[test]
	fn location_is_the_first_frame() {
		let location = Location::caller();
		let exception = exception_for_panic(&"boom", Some(location)).unwrap();
		let frames = parse_stack_trace(exception.stack()).unwrap();
		assert_eq!(frames[0].file, location.file());
		assert_eq!(frames[0].line, location.line());
	}

	#[test]
	fn exception_payload_keeps_identity() {
		let original = Exception::new("Error", "thrown").into_ref();
		let reported = exception_for_panic(&Arc::clone(&original), None).unwrap();
		assert!(Arc::ptr_eq(&original, &reported));
	}

	#[test]
	fn sdk_error_payload_is_ignored() {
		assert!(exception_for_panic(&FlytrapError::NotInitialized, None).is_none());
	}

	#[test]
	fn opaque_payload_gets_placeholder_message() {
		let exception = exception_for_panic(&42_u8, None).unwrap();
		assert_eq!(exception.message(), "Box<dyn Any>");
	}
}
