// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! User context resolution.
//!
//! Hosts inject providers for whatever identity source they have (request
//! context, config file, keychain). Resolution is best-effort and total:
//! when every provider comes up empty the tracker falls back to a generated
//! session identity rather than failing.

use flare_core::{UserContext, UNKNOWN_IP};
use uuid::Uuid;

/// A source of the current user identity.
///
/// `resolve` returns `None` when the source has nothing; it must not block
/// or fail. Providers are consulted in registration order.
pub trait UserContextProvider: Send + Sync {
	fn resolve(&self) -> Option<UserContext>;
}

/// Provider backed by a fixed context. Useful for hosts that know their
/// user up front, and for tests.
pub struct StaticUserProvider {
	context: UserContext,
}

impl StaticUserProvider {
	pub fn new(context: UserContext) -> Self {
		Self { context }
	}
}

impl UserContextProvider for StaticUserProvider {
	fn resolve(&self) -> Option<UserContext> {
		Some(self.context.clone())
	}
}

/// Consult providers in order; fall back to a generated session context.
pub fn detect_user(
	providers: &[Box<dyn UserContextProvider>],
	user_agent: Option<&str>,
) -> UserContext {
	providers
		.iter()
		.find_map(|p| p.resolve())
		.unwrap_or_else(|| session_fallback(user_agent))
}

/// Anonymous fallback carrying only a session identifier, the user agent,
/// and the unknown-IP marker.
pub fn session_fallback(user_agent: Option<&str>) -> UserContext {
	UserContext {
		id: Some(format!("session_{}", Uuid::now_v7())),
		username: None,
		email: None,
		ip_address: Some(UNKNOWN_IP.to_string()),
		user_agent: user_agent.map(str::to_string),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct EmptyProvider;

	impl UserContextProvider for EmptyProvider {
		fn resolve(&self) -> Option<UserContext> {
			None
		}
	}

	#[test]
	fn first_resolving_provider_wins() {
		let providers: Vec<Box<dyn UserContextProvider>> = vec![
			Box::new(EmptyProvider),
			Box::new(StaticUserProvider::new(UserContext {
				id: Some("u_primary".to_string()),
				..Default::default()
			})),
			Box::new(StaticUserProvider::new(UserContext {
				id: Some("u_secondary".to_string()),
				..Default::default()
			})),
		];

		let user = detect_user(&providers, None);
		assert_eq!(user.id.as_deref(), Some("u_primary"));
	}

	#[test]
	fn falls_back_to_session_context() {
		let providers: Vec<Box<dyn UserContextProvider>> = vec![Box::new(EmptyProvider)];
		let user = detect_user(&providers, Some("flare-test/1.0"));

		assert!(user.id.unwrap().starts_with("session_"));
		assert_eq!(user.ip_address.as_deref(), Some(UNKNOWN_IP));
		assert_eq!(user.user_agent.as_deref(), Some("flare-test/1.0"));
	}

	#[test]
	fn no_providers_still_resolves() {
		let user = detect_user(&[], None);
		assert!(user.id.is_some());
	}
}
