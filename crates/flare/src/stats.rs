// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Aggregate statistics over the event buffer.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flare_core::ErrorEvent;

/// Number of trailing one-hour trend buckets.
pub const TREND_BUCKETS: usize = 24;

/// Aggregated view of the captured events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorStats {
	pub total: u64,
	/// Event count per severity level.
	pub by_level: HashMap<String, u64>,
	/// Event count per exception type.
	pub by_type: HashMap<String, u64>,
	/// Trailing 24 one-hour windows, oldest first; the last bucket is the
	/// most recent hour.
	pub hourly_trend: Vec<u64>,
}

/// Compute stats over the buffer as of `now`.
pub fn compute_stats(buffer: &VecDeque<ErrorEvent>, now: DateTime<Utc>) -> ErrorStats {
	let mut by_level: HashMap<String, u64> = HashMap::new();
	let mut by_type: HashMap<String, u64> = HashMap::new();
	let mut hourly_trend = vec![0u64; TREND_BUCKETS];

	for event in buffer {
		*by_level.entry(event.level.to_string()).or_default() += 1;
		*by_type
			.entry(event.exception.exception_type.clone())
			.or_default() += 1;

		let age = now.signed_duration_since(event.timestamp);
		let hours_ago = age.num_hours();
		if (0..TREND_BUCKETS as i64).contains(&hours_ago) {
			hourly_trend[TREND_BUCKETS - 1 - hours_ago as usize] += 1;
		}
	}

	ErrorStats {
		total: buffer.len() as u64,
		by_level,
		by_type,
		hourly_trend,
	}
}
