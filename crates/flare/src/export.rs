// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JSON export of the tracker's full state.
//!
//! This is the only durable format boundary of the SDK; the document must
//! round-trip as valid JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use flare_core::{Breadcrumb, ErrorEvent, TrackerConfig, UserContext};

use crate::stats::ErrorStats;

/// Complete exported snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
	/// Export time, RFC 3339.
	pub exported_at: DateTime<Utc>,
	pub events: Vec<ErrorEvent>,
	pub breadcrumbs: Vec<Breadcrumb>,
	pub user_context: Option<UserContext>,
	pub stats: ErrorStats,
	pub config: TrackerConfig,
}
