// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Flare: in-process error and telemetry capture SDK.
//!
//! Captures structured error events with breadcrumb trails, user and request
//! context, stable grouping hashes, sampling and filtering, alert-rule
//! evaluation with throttling, and fire-and-forget delivery to a collector,
//! a chat webhook, and generic signed webhooks.
//!
//! State is instance-owned: construct an [`ErrorTracker`] with
//! [`ErrorTracker::builder`] and pass it around, or use the process-wide
//! [`global`] instance when dependency injection is not practical.

pub mod delivery;
pub mod error;
pub mod export;
pub mod instrument;
pub mod ring;
pub mod rules;
pub mod sampling;
pub mod stats;
pub mod tracker;
pub mod user;

pub use delivery::DeliveryDispatcher;
pub use error::{Result, TrackerError};
pub use export::ExportData;
pub use ring::BreadcrumbRing;
pub use rules::{AlertRuleEngine, TriggeredAlert};
pub use sampling::SamplingFilter;
pub use stats::{compute_stats, ErrorStats, TREND_BUCKETS};
pub use tracker::{CaptureContext, ErrorTracker, EventFilter, TrackerBuilder, TrackerState};
pub use user::{detect_user, StaticUserProvider, UserContextProvider};

pub use flare_core as core;

use std::sync::OnceLock;

static GLOBAL: OnceLock<ErrorTracker> = OnceLock::new();

/// Install a configured tracker as the process-wide instance.
///
/// Returns `false` when a global tracker is already installed; the existing
/// instance is kept.
pub fn init_global(tracker: ErrorTracker) -> bool {
	GLOBAL.set(tracker).is_ok()
}

/// The process-wide tracker.
///
/// If none was installed with [`init_global`], a default-configured tracker
/// is created and initialized on first use.
pub fn global() -> &'static ErrorTracker {
	GLOBAL.get_or_init(|| {
		let tracker = ErrorTracker::builder().build();
		tracker.initialize();
		tracker
	})
}
