// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The error tracker facade.
//!
//! Owns all mutable capture state (event buffer, breadcrumb ring, grouping
//! counters, alert throttle timestamps) behind one `Arc`-shared inner
//! struct. Synchronous mutations complete before any suspension point;
//! only delivery is async, and it is fire-and-forget. No capture operation
//! surfaces an error to the host.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use flare_core::{
	fingerprint_digest, grouping_hash, parse_stack, AlertRule, Breadcrumb, ErrorEvent, ErrorLevel,
	EventId, Mechanism, MechanismKind, RequestContext, TrackerConfig, TrackerConfigLayer,
	UserContext,
};

use crate::delivery::DeliveryDispatcher;
use crate::export::ExportData;
use crate::ring::BreadcrumbRing;
use crate::rules::AlertRuleEngine;
use crate::sampling::SamplingFilter;
use crate::stats::{compute_stats, ErrorStats};
use crate::user::{detect_user, UserContextProvider};

/// Lifecycle of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
	Uninitialized,
	Initializing,
	Active,
}

/// Caller-supplied overrides merged into a captured event.
///
/// Tags and extra are additive: they are merged over the tracker's global
/// values and under nothing; caller entries win on key collision.
#[derive(Debug, Clone, Default)]
pub struct CaptureContext {
	pub level: Option<ErrorLevel>,
	pub tags: HashMap<String, String>,
	pub extra: serde_json::Map<String, serde_json::Value>,
	pub fingerprint: Option<Vec<String>>,
	pub request: Option<RequestContext>,
	pub user: Option<UserContext>,
}

/// Filter for `get_events`.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
	pub level: Option<ErrorLevel>,
	pub exception_type: Option<String>,
	pub since: Option<DateTime<Utc>>,
	pub limit: Option<usize>,
}

/// Builder for constructing an ErrorTracker.
pub struct TrackerBuilder {
	layer: TrackerConfigLayer,
	providers: Vec<Box<dyn UserContextProvider>>,
	sampler: Option<SamplingFilter>,
	user_agent: Option<String>,
}

impl TrackerBuilder {
	pub fn new() -> Self {
		Self {
			layer: TrackerConfigLayer::default(),
			providers: Vec::new(),
			sampler: None,
			user_agent: None,
		}
	}

	/// Merge a configuration layer; later layers win.
	pub fn config(mut self, layer: TrackerConfigLayer) -> Self {
		self.layer.merge(layer);
		self
	}

	/// Sets the remote collector base URL.
	pub fn endpoint(mut self, url: impl Into<String>) -> Self {
		self.layer.endpoint = Some(url.into());
		self
	}

	/// Sets the environment name.
	///
	/// Example: `production`, `staging`, `development`
	pub fn environment(mut self, env: impl Into<String>) -> Self {
		self.layer.environment = Some(env.into());
		self
	}

	/// Sets the release version.
	pub fn release(mut self, release: impl Into<String>) -> Self {
		self.layer.release = Some(release.into());
		self
	}

	/// Registers a user-context source; consulted in registration order.
	pub fn user_provider(mut self, provider: impl UserContextProvider + 'static) -> Self {
		self.providers.push(Box::new(provider));
		self
	}

	/// Sets the user agent recorded in fallback user contexts.
	pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
		self.user_agent = Some(agent.into());
		self
	}

	/// Replaces the sampling filter. Test seam for deterministic draws.
	pub fn sampling_filter(mut self, sampler: SamplingFilter) -> Self {
		self.sampler = Some(sampler);
		self
	}

	/// Builds the tracker. Never fails: invalid configuration fields are
	/// clamped to documented defaults.
	pub fn build(self) -> ErrorTracker {
		let config = self.layer.clone().finalize();
		let dispatcher = Arc::new(DeliveryDispatcher::new(Duration::from_secs(
			config.request_timeout_secs,
		)));

		let inner = Arc::new(TrackerInner {
			layer: RwLock::new(self.layer),
			breadcrumbs: RwLock::new(BreadcrumbRing::new(config.limits.max_breadcrumbs)),
			config: RwLock::new(config),
			state: RwLock::new(TrackerState::Uninitialized),
			events: RwLock::new(VecDeque::new()),
			counts: RwLock::new(HashMap::new()),
			last_seen: RwLock::new(HashMap::new()),
			engine: RwLock::new(AlertRuleEngine::new()),
			user: RwLock::new(None),
			tags: RwLock::new(HashMap::new()),
			extra: RwLock::new(serde_json::Map::new()),
			providers: self.providers,
			sampler: self.sampler.unwrap_or_default(),
			dispatcher: RwLock::new(dispatcher),
			user_agent: self.user_agent,
		});

		ErrorTracker { inner }
	}
}

impl Default for TrackerBuilder {
	fn default() -> Self {
		Self::new()
	}
}

struct TrackerInner {
	layer: RwLock<TrackerConfigLayer>,
	config: RwLock<TrackerConfig>,
	state: RwLock<TrackerState>,
	events: RwLock<VecDeque<ErrorEvent>>,
	breadcrumbs: RwLock<BreadcrumbRing>,
	/// Monotonic per-hash occurrence counts; never decremented.
	counts: RwLock<HashMap<String, u64>>,
	/// Per-hash most-recent occurrence.
	last_seen: RwLock<HashMap<String, DateTime<Utc>>>,
	engine: RwLock<AlertRuleEngine>,
	user: RwLock<Option<UserContext>>,
	tags: RwLock<HashMap<String, String>>,
	extra: RwLock<serde_json::Map<String, serde_json::Value>>,
	providers: Vec<Box<dyn UserContextProvider>>,
	sampler: SamplingFilter,
	dispatcher: RwLock<Arc<DeliveryDispatcher>>,
	user_agent: Option<String>,
}

/// In-process error and telemetry capture service.
///
/// # Example
///
/// ```ignore
/// use flare::ErrorTracker;
///
/// let tracker = ErrorTracker::builder()
///     .endpoint("https://telemetry.example.com")
///     .environment("production")
///     .release(env!("CARGO_PKG_VERSION"))
///     .build();
/// tracker.initialize();
///
/// if let Err(e) = do_something() {
///     tracker.capture_exception(&e, None);
/// }
/// ```
#[derive(Clone)]
pub struct ErrorTracker {
	inner: Arc<TrackerInner>,
}

impl ErrorTracker {
	/// Creates a new builder for constructing an ErrorTracker.
	pub fn builder() -> TrackerBuilder {
		TrackerBuilder::new()
	}

	/// Current lifecycle state.
	pub fn state(&self) -> TrackerState {
		*self.inner.state.read()
	}

	/// Transition to Active and run user auto-detection.
	///
	/// Idempotent: re-invoking while Active is a no-op. Manual capture works
	/// in any state; initialization only performs the ambient setup.
	pub fn initialize(&self) {
		{
			let mut state = self.inner.state.write();
			if *state == TrackerState::Active {
				debug!("tracker already initialized");
				return;
			}
			*state = TrackerState::Initializing;
		}

		let detected = detect_user(&self.inner.providers, self.inner.user_agent.as_deref());
		{
			let mut user = self.inner.user.write();
			if user.is_none() {
				*user = Some(detected);
			}
		}

		*self.inner.state.write() = TrackerState::Active;
		info!("error tracker initialized");
	}

	/// Return to Uninitialized. The inverse of `initialize` for tests;
	/// captured data is retained.
	pub fn teardown(&self) {
		*self.inner.state.write() = TrackerState::Uninitialized;
		info!("error tracker torn down");
	}

	/// Capture a fully-formed event.
	///
	/// Applies sampling and filtering, snapshots ambient state, updates
	/// grouping counters, evaluates alert rules, and hands delivery off to
	/// the async runtime. Returns the event id whether or not the event was
	/// admitted.
	pub fn capture_error(&self, mut event: ErrorEvent) -> EventId {
		let id = event.id;
		let config = self.inner.config.read().clone();

		if event.grouping_hash.is_empty() {
			if event.fingerprint.is_empty() {
				event.grouping_hash = grouping_hash(&event.message, None);
				event.fingerprint = vec![event.message.clone()];
			} else {
				event.grouping_hash = fingerprint_digest(&event.fingerprint);
			}
		}

		if !self
			.inner
			.sampler
			.should_capture(&config, &event.message, event.source_filename())
		{
			return id;
		}

		// Snapshots happen synchronously, before any suspension point, so
		// the event reflects state at the moment of capture.
		if event.breadcrumbs.is_empty() {
			event.breadcrumbs = self.inner.breadcrumbs.read().snapshot();
		}
		if event.user == UserContext::default() {
			event.user = self.resolve_user();
		}
		event.tags = self.merged_tags(&config, std::mem::take(&mut event.tags));
		event.extra = self.merged_extra(std::mem::take(&mut event.extra));

		{
			let mut events = self.inner.events.write();
			while events.len() >= config.limits.max_events {
				events.pop_front();
			}
			events.push_back(event.clone());
		}

		let is_new_issue = {
			let mut counts = self.inner.counts.write();
			let mut last_seen = self.inner.last_seen.write();
			let is_new = !last_seen.contains_key(&event.grouping_hash);
			*counts.entry(event.grouping_hash.clone()).or_default() += 1;
			last_seen.insert(event.grouping_hash.clone(), event.timestamp);
			is_new
		};

		let triggered = if config.alerting.enabled {
			let events = self.inner.events.read();
			self.inner.engine.write().evaluate(
				&config.alerting.rules,
				&event,
				&events,
				is_new_issue,
				&config.alerting.throttling,
				Utc::now(),
			)
		} else {
			Vec::new()
		};

		let mut deliverable = Vec::new();
		for alert in triggered {
			if alert.suppressed {
				warn!(rule_id = %alert.rule.id, rule_name = %alert.rule.name, "alert throttled");
			} else {
				deliverable.push(alert.rule);
			}
		}

		if config.is_development() {
			match serde_json::to_string(&event) {
				Ok(json) => debug!(event = %json, "captured event"),
				Err(e) => debug!(error = %e, "captured event (unserializable)"),
			}
		}

		self.spawn_delivery(config, event, deliverable);
		id
	}

	/// Capture a typed error value as an event.
	pub fn capture_exception<E>(&self, error: &E, context: Option<CaptureContext>) -> EventId
	where
		E: std::error::Error + ?Sized,
	{
		let exception_type = short_type_name(std::any::type_name::<E>());
		self.capture_exception_raw(
			&exception_type,
			&error.to_string(),
			"",
			Mechanism {
				kind: MechanismKind::Manual,
				handled: true,
			},
			context,
		)
	}

	/// Capture from raw exception parts, e.g. a host error hook delivering
	/// a type, message, and raw stack string.
	pub fn capture_exception_raw(
		&self,
		exception_type: &str,
		value: &str,
		raw_stack: &str,
		mechanism: Mechanism,
		context: Option<CaptureContext>,
	) -> EventId {
		let mut event = ErrorEvent {
			message: value.to_string(),
			level: ErrorLevel::Error,
			..Default::default()
		};
		event.exception.exception_type = exception_type.to_string();
		event.exception.value = value.to_string();
		event.exception.stacktrace = parse_stack(raw_stack);
		event.exception.mechanism = mechanism;

		apply_context(&mut event, context);
		self.capture_error(event)
	}

	/// Capture a plain message without an exception.
	pub fn capture_message(
		&self,
		message: &str,
		level: Option<ErrorLevel>,
		context: Option<CaptureContext>,
	) -> EventId {
		let mut event = ErrorEvent {
			message: message.to_string(),
			level: level.unwrap_or(ErrorLevel::Info),
			..Default::default()
		};
		event.exception.exception_type = "Message".to_string();
		event.exception.value = message.to_string();

		apply_context(&mut event, context);
		self.capture_error(event)
	}

	/// Adds a breadcrumb to the ring.
	pub fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
		self.inner.breadcrumbs.write().add(breadcrumb);
	}

	/// Clears all breadcrumbs.
	pub fn clear_breadcrumbs(&self) {
		self.inner.breadcrumbs.write().clear();
	}

	/// Snapshot of the breadcrumb ring, oldest first.
	pub fn get_breadcrumbs(&self) -> Vec<Breadcrumb> {
		self.inner.breadcrumbs.read().snapshot()
	}

	/// Sets the current user context.
	pub fn set_user_context(&self, user: UserContext) {
		*self.inner.user.write() = Some(user);
	}

	/// The current user context, if set or detected.
	pub fn get_user_context(&self) -> Option<UserContext> {
		self.inner.user.read().clone()
	}

	/// Sets a global tag attached to all captured events.
	pub fn set_tag(&self, key: impl Into<String>, value: impl Into<String>) {
		self.inner.tags.write().insert(key.into(), value.into());
	}

	/// Removes a global tag.
	pub fn remove_tag(&self, key: &str) {
		self.inner.tags.write().remove(key);
	}

	/// Sets global extra data attached to all captured events.
	pub fn set_extra(&self, key: impl Into<String>, value: serde_json::Value) {
		self.inner.extra.write().insert(key.into(), value);
	}

	/// Events currently in the buffer, optionally filtered.
	pub fn get_events(&self, filter: Option<EventFilter>) -> Vec<ErrorEvent> {
		let events = self.inner.events.read();
		let filter = filter.unwrap_or_default();

		let mut matching: Vec<ErrorEvent> = events
			.iter()
			.filter(|e| filter.level.map_or(true, |level| e.level == level))
			.filter(|e| {
				filter
					.exception_type
					.as_deref()
					.map_or(true, |t| e.exception.exception_type == t)
			})
			.filter(|e| filter.since.map_or(true, |since| e.timestamp >= since))
			.cloned()
			.collect();

		if let Some(limit) = filter.limit {
			// Keep the most recent entries.
			if matching.len() > limit {
				matching.drain(..matching.len() - limit);
			}
		}
		matching
	}

	/// Occurrence count for a grouping hash.
	pub fn get_error_count(&self, grouping_hash: &str) -> u64 {
		self.inner.counts.read().get(grouping_hash).copied().unwrap_or(0)
	}

	/// Aggregate statistics over the buffer.
	pub fn get_error_stats(&self) -> ErrorStats {
		compute_stats(&self.inner.events.read(), Utc::now())
	}

	/// Current effective configuration.
	pub fn get_config(&self) -> TrackerConfig {
		self.inner.config.read().clone()
	}

	/// Apply a partial configuration update.
	pub fn update_config(&self, layer: TrackerConfigLayer) {
		let config = {
			let mut stored = self.inner.layer.write();
			stored.merge(layer);
			stored.clone().finalize()
		};

		{
			let old = self.inner.config.read();
			if old.request_timeout_secs != config.request_timeout_secs {
				*self.inner.dispatcher.write() = Arc::new(DeliveryDispatcher::new(
					Duration::from_secs(config.request_timeout_secs),
				));
			}
		}

		self.inner
			.breadcrumbs
			.write()
			.set_capacity(config.limits.max_breadcrumbs);
		{
			let mut events = self.inner.events.write();
			while events.len() > config.limits.max_events {
				events.pop_front();
			}
		}

		*self.inner.config.write() = config;
		debug!("tracker configuration updated");
	}

	/// Registers an alert rule.
	pub fn add_alert_rule(&self, rule: AlertRule) {
		let mut config = self.inner.config.write();
		config.alerting.rules.retain(|r| r.id != rule.id);
		config.alerting.rules.push(rule);
		self.persist_rules(&config.alerting.rules);
	}

	/// Removes an alert rule and its throttle state.
	pub fn remove_alert_rule(&self, rule_id: &str) -> bool {
		let mut config = self.inner.config.write();
		let before = config.alerting.rules.len();
		config.alerting.rules.retain(|r| r.id != rule_id);
		let removed = config.alerting.rules.len() != before;
		if removed {
			self.persist_rules(&config.alerting.rules);
			self.inner.engine.write().forget_rule(rule_id);
		}
		removed
	}

	/// All configured alert rules.
	pub fn get_alert_rules(&self) -> Vec<AlertRule> {
		self.inner.config.read().alerting.rules.clone()
	}

	/// Clears the event buffer and all grouping counters.
	pub fn clear_events(&self) {
		self.inner.events.write().clear();
		self.inner.counts.write().clear();
		self.inner.last_seen.write().clear();
		debug!("event buffer and counters cleared");
	}

	/// Serialize the tracker's full state as a JSON document.
	pub fn export_data(&self) -> String {
		let export = ExportData {
			exported_at: Utc::now(),
			events: self.get_events(None),
			breadcrumbs: self.get_breadcrumbs(),
			user_context: self.get_user_context(),
			stats: self.get_error_stats(),
			config: self.get_config(),
		};
		serde_json::to_string_pretty(&export).unwrap_or_else(|e| {
			warn!(error = %e, "export serialization failed");
			"{}".to_string()
		})
	}

	fn resolve_user(&self) -> UserContext {
		if let Some(user) = self.inner.user.read().clone() {
			return user;
		}
		let detected = detect_user(&self.inner.providers, self.inner.user_agent.as_deref());
		let mut user = self.inner.user.write();
		user.get_or_insert(detected).clone()
	}

	fn merged_tags(
		&self,
		config: &TrackerConfig,
		event_tags: HashMap<String, String>,
	) -> HashMap<String, String> {
		let mut tags = self.inner.tags.read().clone();
		tags.insert("environment".to_string(), config.environment.clone());
		if let Some(release) = &config.release {
			tags.insert("release".to_string(), release.clone());
		}
		// Event-level tags win on collision.
		tags.extend(event_tags);
		tags
	}

	fn merged_extra(&self, event_extra: serde_json::Value) -> serde_json::Value {
		let mut merged = self.inner.extra.read().clone();
		if let serde_json::Value::Object(map) = event_extra {
			merged.extend(map);
		}
		serde_json::Value::Object(merged)
	}

	fn persist_rules(&self, rules: &[AlertRule]) {
		// Keep the stored layer in sync so later partial updates do not
		// clobber rules registered through the API.
		let mut layer = self.inner.layer.write();
		let alerting = layer.alerting.get_or_insert_with(Default::default);
		alerting.rules = Some(rules.to_vec());
	}

	fn spawn_delivery(&self, config: TrackerConfig, event: ErrorEvent, alerts: Vec<AlertRule>) {
		if config.endpoint.is_none() && alerts.is_empty() {
			return;
		}
		let dispatcher = self.inner.dispatcher.read().clone();
		match tokio::runtime::Handle::try_current() {
			Ok(handle) => {
				handle.spawn(async move {
					dispatcher.deliver_event(&config, &event).await;
					for rule in &alerts {
						dispatcher.deliver_alert(&config, rule, &event).await;
					}
				});
			}
			Err(_) => {
				debug!(event_id = %event.id, "no async runtime available; delivery skipped");
			}
		}
	}
}

/// Apply caller-supplied overrides onto a freshly-built event.
fn apply_context(event: &mut ErrorEvent, context: Option<CaptureContext>) {
	let Some(context) = context else {
		return;
	};

	if let Some(level) = context.level {
		event.level = level;
	}
	event.tags.extend(context.tags);
	match &mut event.extra {
		serde_json::Value::Object(map) => map.extend(context.extra),
		other => *other = serde_json::Value::Object(context.extra),
	}
	if let Some(fingerprint) = context.fingerprint {
		event.fingerprint = fingerprint;
	}
	if let Some(request) = context.request {
		event.request = request;
	}
	if let Some(user) = context.user {
		event.user = user;
	}
}

/// Last path segment of a Rust type name, generics stripped.
///
/// `std::io::Error` becomes `Error`; `dyn std::error::Error` also becomes
/// `Error`.
fn short_type_name(full: &str) -> String {
	let base = full.split('<').next().unwrap_or(full);
	base.rsplit("::").next().unwrap_or(base).trim().to_string()
}
