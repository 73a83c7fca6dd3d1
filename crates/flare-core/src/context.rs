// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Context types for captured events (user, ambient request).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Placeholder IP marker used when a real address is not obtainable.
pub const UNKNOWN_IP: &str = "unknown";

/// User context at capture time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
	pub id: Option<String>,
	pub username: Option<String>,
	pub email: Option<String>,
	/// IP address (sensitive - not displayed by default)
	pub ip_address: Option<String>,
	pub user_agent: Option<String>,
}

impl UserContext {
	/// Best-known display identity for alert payloads.
	pub fn identity(&self) -> &str {
		self.username
			.as_deref()
			.or(self.email.as_deref())
			.or(self.id.as_deref())
			.unwrap_or("anonymous")
	}
}

/// Ambient request/browsing context at capture time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
	pub url: Option<String>,
	pub method: Option<String>,
	pub query_string: Option<String>,
	pub headers: HashMap<String, String>,
	/// Free-form environment flags (e.g. "online", "visibility").
	pub env: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identity_prefers_username() {
		let user = UserContext {
			id: Some("u_1".to_string()),
			username: Some("alice".to_string()),
			email: Some("alice@example.com".to_string()),
			..Default::default()
		};
		assert_eq!(user.identity(), "alice");
	}

	#[test]
	fn identity_falls_back_to_email_then_id() {
		let user = UserContext {
			id: Some("u_1".to_string()),
			email: Some("alice@example.com".to_string()),
			..Default::default()
		};
		assert_eq!(user.identity(), "alice@example.com");

		let user = UserContext {
			id: Some("u_1".to_string()),
			..Default::default()
		};
		assert_eq!(user.identity(), "u_1");
	}

	#[test]
	fn identity_anonymous_when_empty() {
		assert_eq!(UserContext::default().identity(), "anonymous");
	}
}
