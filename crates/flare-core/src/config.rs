// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tracker configuration.
//!
//! Every section follows the layer pattern: a `*Layer` struct of optional
//! fields that can be merged (later layers win) and finalized into the
//! concrete section with documented defaults. Partial runtime updates are
//! expressed as layers. Invalid numeric inputs are clamped, never rejected;
//! telemetry availability wins over strict validation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::alert::{AlertRule, ChannelKind, EscalationPolicy};

const DEFAULT_PROVIDER: &str = "flare";
const DEFAULT_COLLECTOR_PATH: &str = "/api/errors/capture";
const DEFAULT_ENVIRONMENT: &str = "production";
const DEFAULT_ERROR_SAMPLE_RATE: f64 = 1.0;
const DEFAULT_TRANSACTION_SAMPLE_RATE: f64 = 0.1;
const DEFAULT_PROFILES_SAMPLE_RATE: f64 = 0.1;
const DEFAULT_COOLDOWN_SECS: u64 = 300;
const DEFAULT_MAX_ALERTS: u32 = 10;
const DEFAULT_THROTTLE_WINDOW_SECS: u64 = 3600;
const DEFAULT_MAX_EVENTS: usize = 1000;
const DEFAULT_MAX_BREADCRUMBS: usize = 100;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CHAT_CHANNEL: &str = "#alerts";
const DEFAULT_CHAT_USERNAME: &str = "Flare";
const DEFAULT_CHAT_ICON: &str = ":rotating_light:";

/// Clamp a sample rate into `0.0..=1.0`, falling back on non-finite input.
fn clamp_rate(rate: f64, fallback: f64) -> f64 {
	if rate.is_finite() {
		rate.clamp(0.0, 1.0)
	} else {
		fallback
	}
}

/// Sampling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
	/// Fraction of error events admitted (1.0 = always admit).
	pub error_sample_rate: f64,
	pub transaction_sample_rate: f64,
	pub profiles_sample_rate: f64,
	pub session_replay: bool,
	pub performance_monitoring: bool,
}

impl Default for SamplingConfig {
	fn default() -> Self {
		Self {
			error_sample_rate: DEFAULT_ERROR_SAMPLE_RATE,
			transaction_sample_rate: DEFAULT_TRANSACTION_SAMPLE_RATE,
			profiles_sample_rate: DEFAULT_PROFILES_SAMPLE_RATE,
			session_replay: false,
			performance_monitoring: false,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingLayer {
	pub error_sample_rate: Option<f64>,
	pub transaction_sample_rate: Option<f64>,
	pub profiles_sample_rate: Option<f64>,
	pub session_replay: Option<bool>,
	pub performance_monitoring: Option<bool>,
}

impl SamplingLayer {
	pub fn merge(&mut self, other: Self) {
		if other.error_sample_rate.is_some() {
			self.error_sample_rate = other.error_sample_rate;
		}
		if other.transaction_sample_rate.is_some() {
			self.transaction_sample_rate = other.transaction_sample_rate;
		}
		if other.profiles_sample_rate.is_some() {
			self.profiles_sample_rate = other.profiles_sample_rate;
		}
		if other.session_replay.is_some() {
			self.session_replay = other.session_replay;
		}
		if other.performance_monitoring.is_some() {
			self.performance_monitoring = other.performance_monitoring;
		}
	}

	pub fn finalize(self) -> SamplingConfig {
		SamplingConfig {
			error_sample_rate: clamp_rate(
				self.error_sample_rate.unwrap_or(DEFAULT_ERROR_SAMPLE_RATE),
				DEFAULT_ERROR_SAMPLE_RATE,
			),
			transaction_sample_rate: clamp_rate(
				self.transaction_sample_rate
					.unwrap_or(DEFAULT_TRANSACTION_SAMPLE_RATE),
				DEFAULT_TRANSACTION_SAMPLE_RATE,
			),
			profiles_sample_rate: clamp_rate(
				self.profiles_sample_rate
					.unwrap_or(DEFAULT_PROFILES_SAMPLE_RATE),
				DEFAULT_PROFILES_SAMPLE_RATE,
			),
			session_replay: self.session_replay.unwrap_or(false),
			performance_monitoring: self.performance_monitoring.unwrap_or(false),
		}
	}
}

/// Pattern-based event filtering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteringConfig {
	/// Messages containing any of these substrings are dropped.
	pub ignore_errors: Vec<String>,
	/// Source paths containing any of these substrings are dropped.
	pub ignore_urls: Vec<String>,
	/// When non-empty, source paths must contain at least one entry.
	pub allow_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteringLayer {
	pub ignore_errors: Option<Vec<String>>,
	pub ignore_urls: Option<Vec<String>>,
	pub allow_urls: Option<Vec<String>>,
}

impl FilteringLayer {
	pub fn merge(&mut self, other: Self) {
		if other.ignore_errors.is_some() {
			self.ignore_errors = other.ignore_errors;
		}
		if other.ignore_urls.is_some() {
			self.ignore_urls = other.ignore_urls;
		}
		if other.allow_urls.is_some() {
			self.allow_urls = other.allow_urls;
		}
	}

	pub fn finalize(self) -> FilteringConfig {
		FilteringConfig {
			ignore_errors: self.ignore_errors.unwrap_or_default(),
			ignore_urls: self.ignore_urls.unwrap_or_default(),
			allow_urls: self.allow_urls.unwrap_or_default(),
		}
	}
}

/// Per-rule alert throttling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrottlingConfig {
	pub enabled: bool,
	/// Minimum seconds between deliveries of the same rule.
	pub cooldown_secs: u64,
	pub max_alerts: u32,
	pub time_window_secs: u64,
}

impl Default for ThrottlingConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			cooldown_secs: DEFAULT_COOLDOWN_SECS,
			max_alerts: DEFAULT_MAX_ALERTS,
			time_window_secs: DEFAULT_THROTTLE_WINDOW_SECS,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThrottlingLayer {
	pub enabled: Option<bool>,
	pub cooldown_secs: Option<u64>,
	pub max_alerts: Option<u32>,
	pub time_window_secs: Option<u64>,
}

impl ThrottlingLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.cooldown_secs.is_some() {
			self.cooldown_secs = other.cooldown_secs;
		}
		if other.max_alerts.is_some() {
			self.max_alerts = other.max_alerts;
		}
		if other.time_window_secs.is_some() {
			self.time_window_secs = other.time_window_secs;
		}
	}

	pub fn finalize(self) -> ThrottlingConfig {
		ThrottlingConfig {
			enabled: self.enabled.unwrap_or(true),
			cooldown_secs: self.cooldown_secs.unwrap_or(DEFAULT_COOLDOWN_SECS),
			max_alerts: self.max_alerts.unwrap_or(DEFAULT_MAX_ALERTS),
			time_window_secs: self.time_window_secs.unwrap_or(DEFAULT_THROTTLE_WINDOW_SECS),
		}
	}
}

/// Alerting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertingConfig {
	pub enabled: bool,
	/// Default channel set for rules that declare none.
	pub channels: Vec<ChannelKind>,
	pub rules: Vec<AlertRule>,
	pub escalation: EscalationPolicy,
	pub throttling: ThrottlingConfig,
}

impl Default for AlertingConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			channels: Vec::new(),
			rules: Vec::new(),
			escalation: EscalationPolicy::default(),
			throttling: ThrottlingConfig::default(),
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertingLayer {
	pub enabled: Option<bool>,
	pub channels: Option<Vec<ChannelKind>>,
	pub rules: Option<Vec<AlertRule>>,
	pub escalation: Option<EscalationPolicy>,
	pub throttling: Option<ThrottlingLayer>,
}

impl AlertingLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.channels.is_some() {
			self.channels = other.channels;
		}
		if other.rules.is_some() {
			self.rules = other.rules;
		}
		if other.escalation.is_some() {
			self.escalation = other.escalation;
		}
		match (&mut self.throttling, other.throttling) {
			(Some(mine), Some(theirs)) => mine.merge(theirs),
			(mine @ None, theirs @ Some(_)) => *mine = theirs,
			_ => {}
		}
	}

	pub fn finalize(self) -> AlertingConfig {
		AlertingConfig {
			enabled: self.enabled.unwrap_or(true),
			channels: self.channels.unwrap_or_default(),
			rules: self.rules.unwrap_or_default(),
			escalation: self.escalation.unwrap_or_default(),
			throttling: self.throttling.unwrap_or_default().finalize(),
		}
	}
}

/// Chat (Slack-compatible) webhook integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatIntegration {
	pub enabled: bool,
	/// Channel is effectively disabled when unset.
	pub webhook_url: Option<String>,
	pub channel: String,
	pub username: String,
	pub icon_emoji: String,
}

impl Default for ChatIntegration {
	fn default() -> Self {
		Self {
			enabled: false,
			webhook_url: None,
			channel: DEFAULT_CHAT_CHANNEL.to_string(),
			username: DEFAULT_CHAT_USERNAME.to_string(),
			icon_emoji: DEFAULT_CHAT_ICON.to_string(),
		}
	}
}

/// Generic webhook integration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookIntegration {
	pub enabled: bool,
	/// Channel is effectively disabled when unset.
	pub url: Option<String>,
	/// HTTP method; defaults to POST when unset.
	pub method: Option<String>,
	pub headers: HashMap<String, String>,
	/// When set, payloads carry an HMAC-SHA256 signature header.
	pub secret: Option<String>,
}

/// GitHub issue-tracker integration.
///
/// Connection settings only; issue creation is performed server-side, so the
/// SDK carries and exports these fields without opening a delivery path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GithubIntegration {
	pub enabled: bool,
	/// Repository in `owner/name` form.
	pub repo: Option<String>,
	pub token: Option<String>,
	/// Labels applied to issues opened from alerts.
	pub labels: Vec<String>,
}

/// Jira issue-tracker integration.
///
/// Same treatment as [`GithubIntegration`]: representable and exported, no
/// SDK-side delivery path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JiraIntegration {
	pub enabled: bool,
	pub base_url: Option<String>,
	pub project_key: Option<String>,
	pub api_token: Option<String>,
}

/// External delivery integrations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationConfig {
	pub chat: ChatIntegration,
	pub github: GithubIntegration,
	pub jira: JiraIntegration,
	pub webhook: WebhookIntegration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationLayer {
	pub chat: Option<ChatIntegration>,
	pub github: Option<GithubIntegration>,
	pub jira: Option<JiraIntegration>,
	pub webhook: Option<WebhookIntegration>,
}

impl IntegrationLayer {
	pub fn merge(&mut self, other: Self) {
		if other.chat.is_some() {
			self.chat = other.chat;
		}
		if other.github.is_some() {
			self.github = other.github;
		}
		if other.jira.is_some() {
			self.jira = other.jira;
		}
		if other.webhook.is_some() {
			self.webhook = other.webhook;
		}
	}

	pub fn finalize(self) -> IntegrationConfig {
		IntegrationConfig {
			chat: self.chat.unwrap_or_default(),
			github: self.github.unwrap_or_default(),
			jira: self.jira.unwrap_or_default(),
			webhook: self.webhook.unwrap_or_default(),
		}
	}
}

/// In-memory buffer caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
	pub max_events: usize,
	pub max_breadcrumbs: usize,
}

impl Default for LimitsConfig {
	fn default() -> Self {
		Self {
			max_events: DEFAULT_MAX_EVENTS,
			max_breadcrumbs: DEFAULT_MAX_BREADCRUMBS,
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsLayer {
	pub max_events: Option<usize>,
	pub max_breadcrumbs: Option<usize>,
}

impl LimitsLayer {
	pub fn merge(&mut self, other: Self) {
		if other.max_events.is_some() {
			self.max_events = other.max_events;
		}
		if other.max_breadcrumbs.is_some() {
			self.max_breadcrumbs = other.max_breadcrumbs;
		}
	}

	pub fn finalize(self) -> LimitsConfig {
		LimitsConfig {
			// A zero cap would silently discard everything; clamp to 1.
			max_events: self.max_events.unwrap_or(DEFAULT_MAX_EVENTS).max(1),
			max_breadcrumbs: self.max_breadcrumbs.unwrap_or(DEFAULT_MAX_BREADCRUMBS).max(1),
		}
	}
}

/// Complete tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
	/// Informational provider label.
	pub provider: String,
	/// Base URL of the remote collector; delivery is skipped when unset.
	pub endpoint: Option<String>,
	/// Path appended to the endpoint for event capture.
	pub collector_path: String,
	pub environment: String,
	pub release: Option<String>,
	pub sampling: SamplingConfig,
	pub filtering: FilteringConfig,
	pub alerting: AlertingConfig,
	pub integration: IntegrationConfig,
	pub limits: LimitsConfig,
	pub request_timeout_secs: u64,
}

impl Default for TrackerConfig {
	fn default() -> Self {
		TrackerConfigLayer::default().finalize()
	}
}

impl TrackerConfig {
	/// True when the environment is a development one.
	///
	/// Gates the verbose diagnostic dump on the capture path.
	pub fn is_development(&self) -> bool {
		self.environment == "development"
	}
}

/// Partial tracker configuration; all fields optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfigLayer {
	pub provider: Option<String>,
	pub endpoint: Option<String>,
	pub collector_path: Option<String>,
	pub environment: Option<String>,
	pub release: Option<String>,
	pub sampling: Option<SamplingLayer>,
	pub filtering: Option<FilteringLayer>,
	pub alerting: Option<AlertingLayer>,
	pub integration: Option<IntegrationLayer>,
	pub limits: Option<LimitsLayer>,
	pub request_timeout_secs: Option<u64>,
}

impl TrackerConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.provider.is_some() {
			self.provider = other.provider;
		}
		if other.endpoint.is_some() {
			self.endpoint = other.endpoint;
		}
		if other.collector_path.is_some() {
			self.collector_path = other.collector_path;
		}
		if other.environment.is_some() {
			self.environment = other.environment;
		}
		if other.release.is_some() {
			self.release = other.release;
		}
		merge_section(&mut self.sampling, other.sampling, SamplingLayer::merge);
		merge_section(&mut self.filtering, other.filtering, FilteringLayer::merge);
		merge_section(&mut self.alerting, other.alerting, AlertingLayer::merge);
		merge_section(&mut self.integration, other.integration, IntegrationLayer::merge);
		merge_section(&mut self.limits, other.limits, LimitsLayer::merge);
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn finalize(self) -> TrackerConfig {
		TrackerConfig {
			provider: self.provider.unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
			endpoint: self
				.endpoint
				.map(|url| url.trim_end_matches('/').to_string()),
			collector_path: self
				.collector_path
				.unwrap_or_else(|| DEFAULT_COLLECTOR_PATH.to_string()),
			environment: self
				.environment
				.unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
			release: self.release,
			sampling: self.sampling.unwrap_or_default().finalize(),
			filtering: self.filtering.unwrap_or_default().finalize(),
			alerting: self.alerting.unwrap_or_default().finalize(),
			integration: self.integration.unwrap_or_default().finalize(),
			limits: self.limits.unwrap_or_default().finalize(),
			request_timeout_secs: self
				.request_timeout_secs
				.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
		}
	}
}

fn merge_section<L>(mine: &mut Option<L>, theirs: Option<L>, merge: impl FnOnce(&mut L, L)) {
	match (mine.as_mut(), theirs) {
		(Some(mine), Some(theirs)) => merge(mine, theirs),
		(None, Some(theirs)) => *mine = Some(theirs),
		_ => {}
	}
}
