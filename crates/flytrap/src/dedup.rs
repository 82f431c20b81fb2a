// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identity-based record of exceptions already reported automatically.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use flytrap_core::{Exception, ExceptionRef};
use parking_lot::Mutex;

/// Remembers which exception instances have been reported by a hook.
///
/// Entries are keyed by the `Arc` allocation and hold a `Weak`, so the
/// registry never keeps an exception alive. Dead entries are pruned on
/// insert, which also guards against a freed address being reused by a new
/// exception.
#[derive(Debug, Default)]
pub struct DedupRegistry {
	seen: Mutex<HashMap<usize, Weak<Exception>>>,
}

fn key(exception: &ExceptionRef) -> usize {
	Arc::as_ptr(exception) as usize
}

impl DedupRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn has_seen(&self, exception: &ExceptionRef) -> bool {
		let seen = self.seen.lock();
		seen.get(&key(exception))
			.and_then(Weak::upgrade)
			.is_some_and(|existing| Arc::ptr_eq(&existing, exception))
	}

	pub fn mark_seen(&self, exception: &ExceptionRef) {
		self.mark_if_new(exception);
	}

	/// Marks `exception` and returns true if it was not already marked.
	///
	/// Check and insert happen under one lock, so two hooks racing on the same
	/// exception cannot both report it.
	pub fn mark_if_new(&self, exception: &ExceptionRef) -> bool {
		let mut seen = self.seen.lock();
		seen.retain(|_, weak| weak.strong_count() > 0);

		let k = key(exception);
		if let Some(existing) = seen.get(&k).and_then(Weak::upgrade) {
			if Arc::ptr_eq(&existing, exception) {
				return false;
			}
		}
		seen.insert(k, Arc::downgrade(exception));
		true
	}

	/// Number of live exceptions currently marked.
	pub fn len(&self) -> usize {
		self.seen.lock().values().filter(|weak| weak.strong_count() > 0).count()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
