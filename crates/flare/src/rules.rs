// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Alert rule evaluation and per-rule throttling.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Duration, Utc};
use flare_core::{AlertRule, ConditionKind, ErrorEvent, ThrottlingConfig};
use tracing::debug;

/// A rule that matched an incoming event.
///
/// `suppressed` marks rules inside their throttle cooldown: still reported
/// as triggered for logging, but not delivered.
#[derive(Debug, Clone)]
pub struct TriggeredAlert {
	pub rule: AlertRule,
	pub suppressed: bool,
}

/// Evaluates configured rules against incoming events.
///
/// Owns per-rule `last_alerted` timestamps, keyed by rule id; this state is
/// independent of per-error grouping counters.
#[derive(Debug, Default)]
pub struct AlertRuleEngine {
	last_alerted: HashMap<String, DateTime<Utc>>,
}

impl AlertRuleEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Evaluate all rules against an event already appended to the buffer.
	///
	/// Rules are evaluated in declaration order and every enabled, matching
	/// rule fires; one rule triggering never shadows another. `is_new_issue`
	/// is true when the event's grouping hash had no prior occurrence.
	///
	/// The cooldown timestamp is stamped when an alert is admitted for
	/// dispatch, not on delivery confirmation: delivery is fire-and-forget
	/// and its outcome is never observed here. Suppressed alerts do not
	/// refresh the timestamp, so a throttled rule re-fires as soon as the
	/// cooldown from its last admitted alert elapses.
	pub fn evaluate(
		&mut self,
		rules: &[AlertRule],
		event: &ErrorEvent,
		buffer: &VecDeque<ErrorEvent>,
		is_new_issue: bool,
		throttling: &ThrottlingConfig,
		now: DateTime<Utc>,
	) -> Vec<TriggeredAlert> {
		let mut triggered = Vec::new();

		for rule in rules {
			if !rule.enabled {
				continue;
			}
			if !condition_matches(rule, event, buffer, is_new_issue, now) {
				continue;
			}

			let suppressed = self.is_throttled(rule, throttling, now);
			if suppressed {
				debug!(rule_id = %rule.id, rule_name = %rule.name, "alert suppressed by throttle");
			} else {
				self.last_alerted.insert(rule.id.clone(), now);
			}

			triggered.push(TriggeredAlert {
				rule: rule.clone(),
				suppressed,
			});
		}

		triggered
	}

	fn is_throttled(&self, rule: &AlertRule, throttling: &ThrottlingConfig, now: DateTime<Utc>) -> bool {
		if !throttling.enabled {
			return false;
		}
		match self.last_alerted.get(&rule.id) {
			Some(last) => {
				let cooldown = Duration::seconds(throttling.cooldown_secs as i64);
				now.signed_duration_since(*last) < cooldown
			}
			None => false,
		}
	}

	/// Drop throttle state for a removed rule.
	pub fn forget_rule(&mut self, rule_id: &str) {
		self.last_alerted.remove(rule_id);
	}
}

fn condition_matches(
	rule: &AlertRule,
	event: &ErrorEvent,
	buffer: &VecDeque<ErrorEvent>,
	is_new_issue: bool,
	now: DateTime<Utc>,
) -> bool {
	match rule.condition.kind {
		ConditionKind::Frequency => {
			let window = Duration::minutes(rule.condition.time_window_mins as i64);
			let count = buffer
				.iter()
				.filter(|e| now.signed_duration_since(e.timestamp) <= window)
				.count() as u64;
			count >= rule.condition.threshold
		}
		ConditionKind::NewIssue => is_new_issue,
		ConditionKind::Custom => match &rule.condition.filter {
			Some(filter) => event
				.message
				.to_lowercase()
				.contains(&filter.to_lowercase()),
			None => true,
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use flare_core::{AlertCondition, AlertSeverity, ChannelKind};

	fn rule(id: &str, kind: ConditionKind) -> AlertRule {
		AlertRule {
			id: id.to_string(),
			name: format!("rule {id}"),
			condition: AlertCondition {
				kind,
				..Default::default()
			},
			severity: AlertSeverity::Warning,
			channels: vec![ChannelKind::Chat],
			enabled: true,
		}
	}

	fn event(message: &str, timestamp: DateTime<Utc>) -> ErrorEvent {
		ErrorEvent {
			message: message.to_string(),
			timestamp,
			..Default::default()
		}
	}

	fn throttling(enabled: bool, cooldown_secs: u64) -> ThrottlingConfig {
		ThrottlingConfig {
			enabled,
			cooldown_secs,
			..Default::default()
		}
	}

	#[test]
	fn disabled_rules_are_skipped() {
		let mut engine = AlertRuleEngine::new();
		let mut r = rule("r1", ConditionKind::Custom);
		r.enabled = false;

		let now = Utc::now();
		let e = event("boom", now);
		let buffer = VecDeque::from([e.clone()]);
		let triggered = engine.evaluate(&[r], &e, &buffer, false, &throttling(true, 300), now);
		assert!(triggered.is_empty());
	}

	#[test]
	fn frequency_triggers_at_threshold() {
		let mut engine = AlertRuleEngine::new();
		let mut r = rule("r1", ConditionKind::Frequency);
		r.condition.threshold = 3;
		r.condition.time_window_mins = 5;

		let now = Utc::now();
		let throttle = throttling(false, 0);
		let mut buffer = VecDeque::new();

		for n in 1..=3u64 {
			let e = event("boom", now);
			buffer.push_back(e.clone());
			let triggered =
				engine.evaluate(std::slice::from_ref(&r), &e, &buffer, false, &throttle, now);
			if n < 3 {
				assert!(triggered.is_empty(), "should not trigger on event {n}");
			} else {
				assert_eq!(triggered.len(), 1, "should trigger on event {n}");
			}
		}
	}

	#[test]
	fn frequency_ignores_events_outside_window() {
		let mut engine = AlertRuleEngine::new();
		let mut r = rule("r1", ConditionKind::Frequency);
		r.condition.threshold = 2;
		r.condition.time_window_mins = 5;

		let now = Utc::now();
		let old = event("boom", now - Duration::minutes(10));
		let fresh = event("boom", now);
		let buffer = VecDeque::from([old, fresh.clone()]);

		let triggered =
			engine.evaluate(&[r], &fresh, &buffer, false, &throttling(false, 0), now);
		assert!(triggered.is_empty());
	}

	#[test]
	fn new_issue_fires_only_on_first_occurrence() {
		let mut engine = AlertRuleEngine::new();
		let r = rule("r1", ConditionKind::NewIssue);

		let now = Utc::now();
		let e = event("boom", now);
		let buffer = VecDeque::from([e.clone()]);
		let throttle = throttling(false, 0);

		let first = engine.evaluate(std::slice::from_ref(&r), &e, &buffer, true, &throttle, now);
		assert_eq!(first.len(), 1);

		let second =
			engine.evaluate(std::slice::from_ref(&r), &e, &buffer, false, &throttle, now);
		assert!(second.is_empty());
	}

	#[test]
	fn custom_filter_is_case_insensitive() {
		let mut engine = AlertRuleEngine::new();
		let mut r = rule("r1", ConditionKind::Custom);
		r.condition.filter = Some("TIMEOUT".to_string());

		let now = Utc::now();
		let matching = event("connection timeout reached", now);
		let buffer = VecDeque::from([matching.clone()]);
		let throttle = throttling(false, 0);

		let triggered = engine.evaluate(
			std::slice::from_ref(&r),
			&matching,
			&buffer,
			false,
			&throttle,
			now,
		);
		assert_eq!(triggered.len(), 1);

		let other = event("all good", now);
		let triggered =
			engine.evaluate(std::slice::from_ref(&r), &other, &buffer, false, &throttle, now);
		assert!(triggered.is_empty());
	}

	#[test]
	fn custom_without_filter_always_matches() {
		let mut engine = AlertRuleEngine::new();
		let r = rule("r1", ConditionKind::Custom);

		let now = Utc::now();
		let e = event("anything", now);
		let buffer = VecDeque::from([e.clone()]);
		let triggered = engine.evaluate(&[r], &e, &buffer, false, &throttling(false, 0), now);
		assert_eq!(triggered.len(), 1);
	}

	#[test]
	fn all_matching_rules_fire() {
		let mut engine = AlertRuleEngine::new();
		let rules = vec![rule("r1", ConditionKind::Custom), rule("r2", ConditionKind::Custom)];

		let now = Utc::now();
		let e = event("boom", now);
		let buffer = VecDeque::from([e.clone()]);
		let triggered = engine.evaluate(&rules, &e, &buffer, false, &throttling(false, 0), now);
		assert_eq!(triggered.len(), 2);
		assert_eq!(triggered[0].rule.id, "r1");
		assert_eq!(triggered[1].rule.id, "r2");
	}

	#[test]
	fn throttle_suppresses_within_cooldown() {
		let mut engine = AlertRuleEngine::new();
		let r = rule("r1", ConditionKind::Custom);
		let throttle = throttling(true, 300);

		let start = Utc::now();
		let e = event("boom", start);
		let buffer = VecDeque::from([e.clone()]);

		let first =
			engine.evaluate(std::slice::from_ref(&r), &e, &buffer, false, &throttle, start);
		assert!(!first[0].suppressed);

		// Second trigger 100s later: inside cooldown, suppressed.
		let second = engine.evaluate(
			std::slice::from_ref(&r),
			&e,
			&buffer,
			false,
			&throttle,
			start + Duration::seconds(100),
		);
		assert!(second[0].suppressed);

		// Third trigger after the window elapses: delivered again.
		let third = engine.evaluate(
			std::slice::from_ref(&r),
			&e,
			&buffer,
			false,
			&throttle,
			start + Duration::seconds(301),
		);
		assert!(!third[0].suppressed);
	}

	#[test]
	fn suppression_does_not_extend_cooldown() {
		let mut engine = AlertRuleEngine::new();
		let r = rule("r1", ConditionKind::Custom);
		let throttle = throttling(true, 300);

		let start = Utc::now();
		let e = event("boom", start);
		let buffer = VecDeque::from([e.clone()]);

		engine.evaluate(std::slice::from_ref(&r), &e, &buffer, false, &throttle, start);
		engine.evaluate(
			std::slice::from_ref(&r),
			&e,
			&buffer,
			false,
			&throttle,
			start + Duration::seconds(299),
		);
		// Cooldown measured from the delivered alert, not the suppressed one.
		let third = engine.evaluate(
			std::slice::from_ref(&r),
			&e,
			&buffer,
			false,
			&throttle,
			start + Duration::seconds(301),
		);
		assert!(!third[0].suppressed);
	}

	#[test]
	fn throttling_disabled_never_suppresses() {
		let mut engine = AlertRuleEngine::new();
		let r = rule("r1", ConditionKind::Custom);
		let throttle = throttling(false, 300);

		let now = Utc::now();
		let e = event("boom", now);
		let buffer = VecDeque::from([e.clone()]);

		for _ in 0..3 {
			let triggered =
				engine.evaluate(std::slice::from_ref(&r), &e, &buffer, false, &throttle, now);
			assert!(!triggered[0].suppressed);
		}
	}
}
