// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Alert rule model: declarative condition + response.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FlareError;

/// A declarative alerting rule.
///
/// Disabled rules are never evaluated. Per-rule throttle state lives in the
/// engine, keyed by rule id, distinct from per-error grouping state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
	pub id: String,
	pub name: String,
	pub condition: AlertCondition,
	pub severity: AlertSeverity,
	/// Delivery targets, in dispatch order.
	pub channels: Vec<ChannelKind>,
	pub enabled: bool,
}

/// The condition half of a rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertCondition {
	#[serde(rename = "type")]
	pub kind: ConditionKind,
	/// Minimum qualifying event count (frequency rules).
	pub threshold: u64,
	/// Trailing window in minutes (frequency rules).
	pub time_window_mins: u64,
	/// Case-insensitive message substring (custom rules).
	pub filter: Option<String>,
}

impl Default for AlertCondition {
	fn default() -> Self {
		Self {
			kind: ConditionKind::Custom,
			threshold: 1,
			time_window_mins: 5,
			filter: None,
		}
	}
}

/// Kinds of rule conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
	/// Event count within a trailing window reaches the threshold.
	Frequency,
	/// First occurrence of a grouping hash.
	NewIssue,
	/// Optional message filter; matches everything when absent.
	Custom,
}

impl fmt::Display for ConditionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Frequency => write!(f, "frequency"),
			Self::NewIssue => write!(f, "new_issue"),
			Self::Custom => write!(f, "custom"),
		}
	}
}

impl FromStr for ConditionKind {
	type Err = FlareError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"frequency" => Ok(Self::Frequency),
			"new_issue" => Ok(Self::NewIssue),
			"custom" => Ok(Self::Custom),
			_ => Err(FlareError::InvalidConditionKind(s.to_string())),
		}
	}
}

/// Severity attached to a triggered alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
	Info,
	Warning,
	Critical,
}

impl AlertSeverity {
	/// Attachment color used by chat-webhook payloads.
	pub fn color(&self) -> &'static str {
		match self {
			Self::Critical => "danger",
			Self::Warning => "warning",
			Self::Info => "good",
		}
	}
}

impl fmt::Display for AlertSeverity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Info => write!(f, "info"),
			Self::Warning => write!(f, "warning"),
			Self::Critical => write!(f, "critical"),
		}
	}
}

impl FromStr for AlertSeverity {
	type Err = FlareError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"info" => Ok(Self::Info),
			"warning" => Ok(Self::Warning),
			"critical" => Ok(Self::Critical),
			_ => Err(FlareError::InvalidAlertSeverity(s.to_string())),
		}
	}
}

/// Delivery channel targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
	/// Remote collector endpoint (full event payload).
	Collector,
	/// Chat webhook (Slack-compatible message envelope).
	Chat,
	/// Generic webhook (configurable method and headers).
	Webhook,
}

impl fmt::Display for ChannelKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Collector => write!(f, "collector"),
			Self::Chat => write!(f, "chat"),
			Self::Webhook => write!(f, "webhook"),
		}
	}
}

impl FromStr for ChannelKind {
	type Err = FlareError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"collector" => Ok(Self::Collector),
			"chat" => Ok(Self::Chat),
			"webhook" => Ok(Self::Webhook),
			_ => Err(FlareError::InvalidChannelKind(s.to_string())),
		}
	}
}

/// Multi-level escalation policy.
///
/// Declared in configuration so a future scheduler can promote an
/// unacknowledged alert through levels; the executed behavior today is
/// immediate dispatch to the rule's own channel list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EscalationPolicy {
	pub enabled: bool,
	pub levels: Vec<EscalationLevel>,
	pub timeout_secs: u64,
	pub max_escalations: u32,
}

/// One escalation step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationLevel {
	pub delay_secs: u64,
	pub channels: Vec<ChannelKind>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	proptest! {
		#[test]
		fn condition_kind_roundtrip(kind in prop_oneof![
			Just(ConditionKind::Frequency),
			Just(ConditionKind::NewIssue),
			Just(ConditionKind::Custom),
		]) {
			let s = kind.to_string();
			let parsed: ConditionKind = s.parse().unwrap();
			prop_assert_eq!(kind, parsed);
		}

		#[test]
		fn severity_roundtrip(severity in prop_oneof![
			Just(AlertSeverity::Info),
			Just(AlertSeverity::Warning),
			Just(AlertSeverity::Critical),
		]) {
			let s = severity.to_string();
			let parsed: AlertSeverity = s.parse().unwrap();
			prop_assert_eq!(severity, parsed);
		}
	}

	#[test]
	fn severity_colors() {
		assert_eq!(AlertSeverity::Critical.color(), "danger");
		assert_eq!(AlertSeverity::Warning.color(), "warning");
		assert_eq!(AlertSeverity::Info.color(), "good");
	}

	#[test]
	fn rule_serializes_with_snake_case_kind() {
		let rule = AlertRule {
			id: "r1".to_string(),
			name: "New issues".to_string(),
			condition: AlertCondition {
				kind: ConditionKind::NewIssue,
				..Default::default()
			},
			severity: AlertSeverity::Warning,
			channels: vec![ChannelKind::Chat],
			enabled: true,
		};
		let json = serde_json::to_value(&rule).unwrap();
		assert_eq!(json["condition"]["type"], "new_issue");
		assert_eq!(json["channels"][0], "chat");
	}
}
