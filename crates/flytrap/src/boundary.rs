// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error boundary for component trees.
//!
//! The UI framework stays outside the SDK: a render pass is any closure that
//! produces a view or a [`RenderFault`], and the boundary swaps in fallback
//! content once a fault is seen.

use std::sync::Arc;

use flytrap_core::{Exception, ExceptionRef};
use tracing::warn;

/// Fallback content shown when no explicit fallback is configured.
pub const DEFAULT_FALLBACK: &str = "Something went wrong.";

/// An error raised while rendering, with the component trail that led to it.
#[derive(Debug, Clone)]
pub struct RenderFault {
	pub error: ExceptionRef,
	pub component_stack: Option<String>,
}

impl RenderFault {
	pub fn new(error: impl Into<ExceptionRef>) -> Self {
		Self {
			error: error.into(),
			component_stack: None,
		}
	}

	/// Example: `"in Header\nin Layout\nin App"`.
	pub fn with_component_stack(mut self, stack: impl Into<String>) -> Self {
		self.component_stack = Some(stack.into());
		self
	}
}

impl From<Exception> for RenderFault {
	fn from(error: Exception) -> Self {
		Self::new(error.into_ref())
	}
}

/// Receiver for render errors trapped by a boundary.
pub trait RenderErrorSink: Send + Sync {
	fn render_failed(&self, error: ExceptionRef, component_stack: Option<String>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryState {
	Healthy,
	/// Showing fallback content until remounted.
	Faulted,
}

/// Wraps a component subtree and shows fallback content after it fails.
pub struct ErrorBoundary<V> {
	sink: Arc<dyn RenderErrorSink>,
	fallback: V,
	state: BoundaryState,
}

impl<V: Clone> ErrorBoundary<V> {
	/// A boundary with the default fallback text.
	pub fn new(sink: Arc<dyn RenderErrorSink>) -> Self
	where
		V: From<&'static str>,
	{
		Self::with_fallback(sink, V::from(DEFAULT_FALLBACK))
	}

	pub fn with_fallback(sink: Arc<dyn RenderErrorSink>, fallback: V) -> Self {
		Self {
			sink,
			fallback,
			state: BoundaryState::Healthy,
		}
	}

	/// Replaces the fallback content.
	pub fn fallback(mut self, fallback: V) -> Self {
		self.fallback = fallback;
		self
	}

	/// Renders `children`, or the fallback if this boundary has faulted.
	///
	/// The first fault is forwarded to the sink. While faulted, `children`
	/// is not called.
	pub fn render<F>(&mut self, children: F) -> V
	where
		F: FnOnce() -> Result<V, RenderFault>,
	{
		if self.state == BoundaryState::Faulted {
			return self.fallback.clone();
		}

		match children() {
			Ok(view) => view,
			Err(fault) => {
				warn!(error = %fault.error, "[flytrap] Render error caught by boundary");
				self.state = BoundaryState::Faulted;
				self.sink.render_failed(fault.error, fault.component_stack);
				self.fallback.clone()
			}
		}
	}

	/// Returns the boundary to `Healthy` so the next render runs children.
	pub fn remount(&mut self) {
		self.state = BoundaryState::Healthy;
	}

	pub fn state(&self) -> BoundaryState {
		self.state
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use parking_lot::Mutex;

	#[derive(Default)]
	struct CollectingSink {
		faults: Mutex<Vec<(ExceptionRef, Option<String>)>>,
	}

	impl RenderErrorSink for CollectingSink {
		fn render_failed(&self, error: ExceptionRef, component_stack: Option<String>) {
			self.faults.lock().push((error, component_stack));
		}
	}

	fn boundary() -> (Arc<CollectingSink>, ErrorBoundary<String>) {
		let sink = Arc::new(CollectingSink::default());
		(sink.clone(), ErrorBoundary::new(sink))
	}

	#[test]
	fn healthy_boundary_renders_children() {
		let (sink, mut boundary) = boundary();
		assert_eq!(boundary.render(|| Ok("<App/>".to_string())), "<App/>");
		assert_eq!(boundary.state(), BoundaryState::Healthy);
		assert!(sink.faults.lock().is_empty());
	}

	#[test]
	fn fault_shows_default_fallback_and_reports() {
		let (sink, mut boundary) = boundary();
		let view = boundary.render(|| {
			Err(RenderFault::from(Exception::new("Error", "render failed")).with_component_stack("in Header\nin App"))
		});

		assert_eq!(view, DEFAULT_FALLBACK);
		assert_eq!(boundary.state(), BoundaryState::Faulted);
		let faults = sink.faults.lock();
		assert_eq!(faults.len(), 1);
		assert_eq!(faults[0].0.message(), "render failed");
		assert_eq!(faults[0].1.as_deref(), Some("in Header\nin App"));
	}

	#[test]
	fn faulted_boundary_keeps_fallback_without_rerendering() {
		let (sink, mut boundary) = boundary();
		boundary.render(|| Err(Exception::new("Error", "first").into()));

		let mut ran = false;
		let view = boundary.render(|| {
			ran = true;
			Ok("<App/>".to_string())
		});
		assert!(!ran);
		assert_eq!(view, DEFAULT_FALLBACK);
		assert_eq!(sink.faults.lock().len(), 1);
	}

	#[test]
	fn remount_recovers() {
		let (_sink, mut boundary) = boundary();
		boundary.render(|| Err(Exception::new("Error", "first").into()));
		boundary.remount();
		assert_eq!(boundary.render(|| Ok("<App/>".to_string())), "<App/>");
	}

	#[test]
	fn custom_fallback() {
		let (_sink, boundary) = boundary();
		let mut boundary = boundary.fallback("<Oops/>".to_string());
		assert_eq!(boundary.render(|| Err(Exception::new("Error", "x").into())), "<Oops/>");
	}
}
