// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Captured error event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::breadcrumb::Breadcrumb;
use crate::context::{RequestContext, UserContext};
use crate::error::FlareError;

/// Unique identifier for a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
	pub fn new() -> Self {
		Self(Uuid::now_v7())
	}
}

impl Default for EventId {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Display for EventId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for EventId {
	type Err = uuid::Error;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		Ok(Self(Uuid::parse_str(s)?))
	}
}

/// Severity of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorLevel {
	Info,
	Warning,
	Error,
	Critical,
	Fatal,
}

impl fmt::Display for ErrorLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Info => write!(f, "info"),
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
			Self::Critical => write!(f, "critical"),
			Self::Fatal => write!(f, "fatal"),
		}
	}
}

impl FromStr for ErrorLevel {
	type Err = FlareError;

	fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
		match s {
			"info" => Ok(Self::Info),
			"warning" => Ok(Self::Warning),
			"error" => Ok(Self::Error),
			"critical" => Ok(Self::Critical),
			"fatal" => Ok(Self::Fatal),
			_ => Err(FlareError::InvalidErrorLevel(s.to_string())),
		}
	}
}

/// How an event entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MechanismKind {
	/// Automatic capture from an uncaught error hook.
	OnError,
	/// Automatic capture from an unhandled rejection hook.
	OnUnhandledRejection,
	/// Explicit capture through the public API.
	Manual,
}

/// Capture mechanism metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mechanism {
	#[serde(rename = "type")]
	pub kind: MechanismKind,
	pub handled: bool,
}

impl Default for Mechanism {
	fn default() -> Self {
		Self {
			kind: MechanismKind::Manual,
			handled: true,
		}
	}
}

/// A single frame of a parsed stack trace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
	pub function: Option<String>,
	pub filename: Option<String>,
	pub abs_path: Option<String>,
	pub lineno: Option<u32>,
	pub colno: Option<u32>,
	pub in_app: bool,
}

/// An ordered stack trace, outermost call first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stacktrace {
	pub frames: Vec<Frame>,
}

impl Stacktrace {
	pub fn is_empty(&self) -> bool {
		self.frames.is_empty()
	}
}

/// Structured exception detail attached to an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExceptionInfo {
	/// Classifier string, e.g. the error type name or "Message".
	#[serde(rename = "type")]
	pub exception_type: String,
	/// Human-readable error value.
	pub value: String,
	pub stacktrace: Stacktrace,
	pub mechanism: Mechanism,
}

impl Default for ExceptionInfo {
	fn default() -> Self {
		Self {
			exception_type: "Message".to_string(),
			value: String::new(),
			stacktrace: Stacktrace::default(),
			mechanism: Mechanism::default(),
		}
	}
}

/// One captured incident.
///
/// The `user`, `request` and `breadcrumbs` fields are by-value snapshots
/// taken at capture time; later mutation of the live tracker state does not
/// alter historical events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEvent {
	pub id: EventId,
	pub timestamp: DateTime<Utc>,
	pub level: ErrorLevel,
	pub message: String,
	pub exception: ExceptionInfo,
	pub user: UserContext,
	pub request: RequestContext,
	pub breadcrumbs: Vec<Breadcrumb>,
	pub tags: HashMap<String, String>,
	pub extra: serde_json::Value,
	/// Ordered grouping input parts.
	pub fingerprint: Vec<String>,
	/// Stable hash clustering duplicate events.
	pub grouping_hash: String,
}

impl Default for ErrorEvent {
	fn default() -> Self {
		Self {
			id: EventId::new(),
			timestamp: Utc::now(),
			level: ErrorLevel::Error,
			message: String::new(),
			exception: ExceptionInfo::default(),
			user: UserContext::default(),
			request: RequestContext::default(),
			breadcrumbs: Vec::new(),
			tags: HashMap::new(),
			extra: serde_json::Value::Object(serde_json::Map::new()),
			fingerprint: Vec::new(),
			grouping_hash: String::new(),
		}
	}
}

impl ErrorEvent {
	/// The source filename of the top stack frame, if any.
	///
	/// Used by URL-based filtering; manually captured messages typically
	/// have no frames and therefore no filename.
	pub fn source_filename(&self) -> Option<&str> {
		self.exception
			.stacktrace
			.frames
			.first()
			.and_then(|f| f.filename.as_deref())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn error_level_roundtrip(level in prop_oneof![
			Just(ErrorLevel::Info),
			Just(ErrorLevel::Warning),
			Just(ErrorLevel::Error),
			Just(ErrorLevel::Critical),
			Just(ErrorLevel::Fatal),
		]) {
			let s = level.to_string();
			let parsed: ErrorLevel = s.parse().unwrap();
			prop_assert_eq!(level, parsed);
		}

		#[test]
		fn event_id_roundtrip(uuid_bytes in any::<[u8; 16]>()) {
			let id = EventId(Uuid::from_bytes(uuid_bytes));
			let s = id.to_string();
			let parsed: EventId = s.parse().unwrap();
			prop_assert_eq!(id, parsed);
		}
	}

	#[test]
	fn event_serializes_to_json() {
		let event = ErrorEvent {
			message: "boom".to_string(),
			..Default::default()
		};
		let json = serde_json::to_value(&event).unwrap();
		assert_eq!(json["message"], "boom");
		assert_eq!(json["level"], "error");
		assert_eq!(json["exception"]["type"], "Message");
	}

	#[test]
	fn source_filename_from_top_frame() {
		let mut event = ErrorEvent::default();
		assert_eq!(event.source_filename(), None);

		event.exception.stacktrace.frames.push(Frame {
			filename: Some("/app/main.js".to_string()),
			..Default::default()
		});
		assert_eq!(event.source_filename(), Some("/app/main.js"));
	}
}
