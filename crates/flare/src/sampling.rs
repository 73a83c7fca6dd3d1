// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Admission control: probabilistic sampling AND pattern filtering.

use flare_core::TrackerConfig;
use tracing::debug;

/// Decides whether a draft event is admitted into the buffer.
///
/// Two independent gates, combined with AND: a uniform sampling draw against
/// `sampling.error_sample_rate`, and substring filters over the message and
/// the source filename. A missing filename never rejects on its own; the
/// URL gates treat it as non-matching rather than failing closed.
pub struct SamplingFilter {
	draw: Box<dyn Fn() -> f64 + Send + Sync>,
}

impl SamplingFilter {
	pub fn new() -> Self {
		Self {
			draw: Box::new(fastrand::f64),
		}
	}

	/// Use a fixed draw source. Test seam.
	pub fn with_draw(draw: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
		Self {
			draw: Box::new(draw),
		}
	}

	pub fn should_capture(
		&self,
		config: &TrackerConfig,
		message: &str,
		source_filename: Option<&str>,
	) -> bool {
		let rate = config.sampling.error_sample_rate;
		if (self.draw)() >= rate {
			debug!(rate, "event dropped by sampling");
			return false;
		}

		let filtering = &config.filtering;
		if filtering
			.ignore_errors
			.iter()
			.any(|pattern| message.contains(pattern.as_str()))
		{
			debug!(message, "event dropped by ignore_errors");
			return false;
		}

		if let Some(filename) = source_filename {
			if filtering
				.ignore_urls
				.iter()
				.any(|pattern| filename.contains(pattern.as_str()))
			{
				debug!(filename, "event dropped by ignore_urls");
				return false;
			}

			if !filtering.allow_urls.is_empty()
				&& !filtering
					.allow_urls
					.iter()
					.any(|pattern| filename.contains(pattern.as_str()))
			{
				debug!(filename, "event dropped by allow_urls");
				return false;
			}
		}

		true
	}
}

impl Default for SamplingFilter {
	fn default() -> Self {
		Self::new()
	}
}
