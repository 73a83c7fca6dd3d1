// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fixed-capacity FIFO ring of recent breadcrumbs.

use std::collections::VecDeque;

use flare_core::Breadcrumb;

/// A bounded breadcrumb log.
///
/// When the ring is full, the oldest entry is evicted. Readers only ever see
/// defensive copies; the live ring is never handed out.
#[derive(Debug)]
pub struct BreadcrumbRing {
	entries: VecDeque<Breadcrumb>,
	capacity: usize,
}

impl BreadcrumbRing {
	pub fn new(capacity: usize) -> Self {
		Self {
			entries: VecDeque::with_capacity(capacity.min(1024)),
			capacity: capacity.max(1),
		}
	}

	/// Append a breadcrumb, evicting the head when over capacity.
	pub fn add(&mut self, breadcrumb: Breadcrumb) {
		if self.entries.len() >= self.capacity {
			self.entries.pop_front();
		}
		self.entries.push_back(breadcrumb);
	}

	/// Snapshot of the ring in insertion order.
	pub fn snapshot(&self) -> Vec<Breadcrumb> {
		self.entries.iter().cloned().collect()
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Update the cap; excess oldest entries are evicted immediately.
	pub fn set_capacity(&mut self, capacity: usize) {
		self.capacity = capacity.max(1);
		while self.entries.len() > self.capacity {
			self.entries.pop_front();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn crumb(label: &str) -> Breadcrumb {
		Breadcrumb {
			message: Some(label.to_string()),
			..Default::default()
		}
	}

	#[test]
	fn evicts_oldest_first() {
		let mut ring = BreadcrumbRing::new(3);
		for label in ["a", "b", "c", "d"] {
			ring.add(crumb(label));
		}

		let snapshot = ring.snapshot();
		assert_eq!(snapshot.len(), 3);
		assert_eq!(snapshot[0].message.as_deref(), Some("b"));
		assert_eq!(snapshot[2].message.as_deref(), Some("d"));
	}

	#[test]
	fn snapshot_is_detached() {
		let mut ring = BreadcrumbRing::new(10);
		ring.add(crumb("a"));

		let snapshot = ring.snapshot();
		ring.add(crumb("b"));
		assert_eq!(snapshot.len(), 1);
		assert_eq!(ring.len(), 2);
	}

	#[test]
	fn clear_empties_ring() {
		let mut ring = BreadcrumbRing::new(10);
		ring.add(crumb("a"));
		ring.clear();
		assert!(ring.is_empty());
	}

	#[test]
	fn shrinking_capacity_evicts() {
		let mut ring = BreadcrumbRing::new(5);
		for label in ["a", "b", "c", "d", "e"] {
			ring.add(crumb(label));
		}
		ring.set_capacity(2);
		let snapshot = ring.snapshot();
		assert_eq!(snapshot.len(), 2);
		assert_eq!(snapshot[0].message.as_deref(), Some("d"));
	}

	proptest! {
		#[test]
		fn keeps_exactly_last_n_in_order(labels in proptest::collection::vec(0u32..1000, 0..300), cap in 1usize..50) {
			let mut ring = BreadcrumbRing::new(cap);
			for label in &labels {
				ring.add(crumb(&label.to_string()));
			}

			let snapshot = ring.snapshot();
			let expected: Vec<String> = labels
				.iter()
				.rev()
				.take(cap)
				.rev()
				.map(|l| l.to_string())
				.collect();
			let actual: Vec<String> = snapshot
				.iter()
				.map(|b| b.message.clone().unwrap())
				.collect();
			prop_assert_eq!(actual, expected);
		}
	}
}
