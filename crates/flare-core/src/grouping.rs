// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Grouping hash computation for clustering duplicate events.
//!
//! The grouping hash is a best-effort clustering key, not a security or
//! correctness boundary: collisions are acceptable and expected at scale.

use sha2::{Digest, Sha256};

const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Compute the grouping hash for a message plus optional context.
///
/// Deterministic and order-sensitive: the inputs are colon-joined (message
/// then context) and folded through a 32-bit rolling polynomial hash, then
/// rendered in base 36. Identical inputs always hash identically, which is
/// what makes counting and dedup possible without storing prior hashes.
pub fn grouping_hash(message: &str, extra: Option<&str>) -> String {
	let input = match extra {
		Some(extra) => format!("{message}:{extra}"),
		None => message.to_string(),
	};

	let mut hash: i32 = 0;
	for unit in input.encode_utf16() {
		hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
	}

	to_base36(hash.unsigned_abs())
}

/// Digest an explicit ordered fingerprint into a stable hex key.
///
/// Used when a caller supplies a custom fingerprint list instead of relying
/// on message-based grouping.
pub fn fingerprint_digest(parts: &[String]) -> String {
	let mut hasher = Sha256::new();
	for part in parts {
		hasher.update(part.as_bytes());
		hasher.update(b"|");
	}
	hex::encode(hasher.finalize())
}

fn to_base36(mut value: u32) -> String {
	if value == 0 {
		return "0".to_string();
	}
	let mut digits = Vec::new();
	while value > 0 {
		digits.push(BASE36_DIGITS[(value % 36) as usize]);
		value /= 36;
	}
	digits.reverse();
	String::from_utf8(digits).expect("base36 digits are ASCII")
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn grouping_hash_is_stable(message in ".*", extra in proptest::option::of(".*")) {
			let first = grouping_hash(&message, extra.as_deref());
			let second = grouping_hash(&message, extra.as_deref());
			prop_assert_eq!(first, second);
		}

		#[test]
		fn grouping_hash_is_base36(message in ".*") {
			let hash = grouping_hash(&message, None);
			prop_assert!(!hash.is_empty());
			prop_assert!(hash.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
		}
	}

	#[test]
	fn context_changes_hash() {
		let bare = grouping_hash("Network Error", None);
		let with_context = grouping_hash("Network Error", Some("checkout"));
		assert_ne!(bare, with_context);
	}

	#[test]
	fn order_sensitive_join() {
		// "a" with context "b" joins as "a:b", distinct from "b" with "a".
		assert_ne!(
			grouping_hash("a", Some("b")),
			grouping_hash("b", Some("a"))
		);
	}

	#[test]
	fn empty_message_hashes() {
		assert_eq!(grouping_hash("", None), "0");
	}

	#[test]
	fn fingerprint_digest_is_ordered() {
		let ab = fingerprint_digest(&["a".to_string(), "b".to_string()]);
		let ba = fingerprint_digest(&["b".to_string(), "a".to_string()]);
		assert_ne!(ab, ba);
		assert_eq!(ab.len(), 64);
	}
}
