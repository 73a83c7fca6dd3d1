// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Explicit instrumentation helpers.
//!
//! Transparent interception of global bindings (console wrapping, history
//! patching) belongs to dynamic scripting hosts. Here the host calls these
//! helpers directly from its own middleware or event subscriptions; each one
//! records a well-formed breadcrumb on the tracker.

use chrono::Utc;
use serde_json::json;

use flare_core::{Breadcrumb, BreadcrumbLevel, BreadcrumbType};

use crate::tracker::ErrorTracker;

impl ErrorTracker {
	/// Record a navigation transition.
	pub fn record_navigation(&self, from: &str, to: &str) {
		self.add_breadcrumb(Breadcrumb {
			timestamp: Utc::now(),
			kind: BreadcrumbType::Navigation,
			category: "navigation".to_string(),
			message: Some(format!("{from} -> {to}")),
			level: BreadcrumbLevel::Info,
			data: json!({ "from": from, "to": to }),
		});
	}

	/// Record a user interaction with a UI target.
	pub fn record_click(&self, target: &str) {
		self.add_breadcrumb(Breadcrumb {
			timestamp: Utc::now(),
			kind: BreadcrumbType::User,
			category: "ui.click".to_string(),
			message: Some(target.to_string()),
			level: BreadcrumbLevel::Info,
			data: json!({ "target": target }),
		});
	}

	/// Record a console/log line emitted by the host.
	pub fn record_console(&self, level: BreadcrumbLevel, message: &str) {
		self.add_breadcrumb(Breadcrumb {
			timestamp: Utc::now(),
			kind: BreadcrumbType::Console,
			category: "console".to_string(),
			message: Some(message.to_string()),
			level,
			data: json!({}),
		});
	}

	/// Record an outbound HTTP request observed by the host.
	pub fn record_http(&self, method: &str, url: &str, status: Option<u16>) {
		self.add_breadcrumb(Breadcrumb {
			timestamp: Utc::now(),
			kind: BreadcrumbType::Http,
			category: "http".to_string(),
			message: Some(format!("{method} {url}")),
			level: match status {
				Some(s) if s >= 500 => BreadcrumbLevel::Error,
				Some(s) if s >= 400 => BreadcrumbLevel::Warning,
				_ => BreadcrumbLevel::Info,
			},
			data: json!({ "method": method, "url": url, "status": status }),
		});
	}
}
