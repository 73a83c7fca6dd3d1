// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fan-out delivery of events and alerts to external channels.
//!
//! Delivery must never fail the host application: every channel error is
//! caught here and logged, and unconfigured or disabled channels are
//! silently skipped. There is no retry; a timeout is just a logged failure.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::json;
use sha2::Sha256;
use tracing::{debug, error};

use flare_core::{AlertRule, ChannelKind, ErrorEvent, TrackerConfig};

use crate::error::{Result, TrackerError};

type HmacSha256 = Hmac<Sha256>;

/// Signature header attached to generic webhook deliveries when a secret is
/// configured.
pub const SIGNATURE_HEADER: &str = "X-Flare-Signature";

/// Dispatches payloads to the configured delivery channels.
pub struct DeliveryDispatcher {
	http: Client,
}

impl DeliveryDispatcher {
	pub fn new(request_timeout: Duration) -> Self {
		let http = Client::builder()
			.timeout(request_timeout)
			.build()
			.unwrap_or_else(|e| {
				error!(error = %e, "failed to build HTTP client, using defaults");
				Client::new()
			});
		Self { http }
	}

	/// Send a captured event to the remote collector.
	///
	/// Fire-and-forget semantics: failures are logged, never propagated.
	pub async fn deliver_event(&self, config: &TrackerConfig, event: &ErrorEvent) {
		match self.send_collector(config, event).await {
			Ok(()) => debug!(event_id = %event.id, "event delivered to collector"),
			Err(TrackerError::ChannelUnconfigured(channel)) => {
				debug!(channel, "delivery skipped: channel not configured");
			}
			Err(e) => error!(event_id = %event.id, error = %e, "collector delivery failed"),
		}
	}

	/// Fan an alert out to every channel the rule names.
	pub async fn deliver_alert(&self, config: &TrackerConfig, rule: &AlertRule, event: &ErrorEvent) {
		for channel in &rule.channels {
			let outcome = match channel {
				ChannelKind::Collector => self.send_collector(config, event).await,
				ChannelKind::Chat => self.send_chat(config, rule, event).await,
				ChannelKind::Webhook => self.send_webhook(config, rule, event).await,
			};
			match outcome {
				Ok(()) => {
					debug!(rule_id = %rule.id, channel = %channel, "alert delivered");
				}
				Err(TrackerError::ChannelUnconfigured(channel)) => {
					debug!(channel, "alert skipped: channel not configured");
				}
				Err(e) => {
					error!(rule_id = %rule.id, channel = %channel, error = %e, "alert delivery failed");
				}
			}
		}
	}

	async fn send_collector(&self, config: &TrackerConfig, event: &ErrorEvent) -> Result<()> {
		let endpoint = config
			.endpoint
			.as_deref()
			.ok_or(TrackerError::ChannelUnconfigured("collector"))?;
		let url = format!("{}{}", endpoint, config.collector_path);
		self.post_json(Method::POST, &url, &[], event).await
	}

	async fn send_chat(
		&self,
		config: &TrackerConfig,
		rule: &AlertRule,
		event: &ErrorEvent,
	) -> Result<()> {
		let chat = &config.integration.chat;
		if !chat.enabled {
			return Err(TrackerError::ChannelUnconfigured("chat"));
		}
		let url = chat
			.webhook_url
			.as_deref()
			.ok_or(TrackerError::ChannelUnconfigured("chat"))?;

		let payload = json!({
			"channel": chat.channel,
			"username": chat.username,
			"icon_emoji": chat.icon_emoji,
			"text": format!(":rotating_light: *{}*", rule.name),
			"attachments": [{
				"color": rule.severity.color(),
				"fields": [
					{ "title": "Error", "value": event.message, "short": false },
					{ "title": "Environment", "value": config.environment, "short": true },
					{ "title": "User", "value": event.user.identity(), "short": true },
				],
			}],
		});

		self.post_json(Method::POST, url, &[], &payload).await
	}

	async fn send_webhook(
		&self,
		config: &TrackerConfig,
		rule: &AlertRule,
		event: &ErrorEvent,
	) -> Result<()> {
		let webhook = &config.integration.webhook;
		if !webhook.enabled {
			return Err(TrackerError::ChannelUnconfigured("webhook"));
		}
		let url = webhook
			.url
			.as_deref()
			.ok_or(TrackerError::ChannelUnconfigured("webhook"))?;

		let method = webhook
			.method
			.as_deref()
			.and_then(|m| Method::from_bytes(m.to_uppercase().as_bytes()).ok())
			.unwrap_or(Method::POST);

		let payload = json!({
			"rule": rule,
			"event": event,
			"timestamp": chrono::Utc::now().to_rfc3339(),
			"environment": config.environment,
		});

		let mut headers: Vec<(String, String)> = webhook
			.headers
			.iter()
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect();
		if let Some(secret) = webhook.secret.as_deref() {
			let body = serde_json::to_vec(&payload)?;
			let signature = sign_payload(secret.as_bytes(), &body);
			headers.push((SIGNATURE_HEADER.to_string(), signature));
		}

		self.post_json(method, url, &headers, &payload).await
	}

	async fn post_json<T: Serialize + ?Sized>(
		&self,
		method: Method,
		url: &str,
		headers: &[(String, String)],
		payload: &T,
	) -> Result<()> {
		let mut request = self.http.request(method, url).json(payload);
		for (name, value) in headers {
			request = request.header(name, value);
		}

		let response = request.send().await?;
		if !response.status().is_success() {
			let status = response.status().as_u16();
			let message = response.text().await.unwrap_or_default();
			return Err(TrackerError::DeliveryFailed { status, message });
		}
		Ok(())
	}
}

/// Hex-encoded HMAC-SHA256 over the payload body.
pub fn sign_payload(secret: &[u8], payload: &[u8]) -> String {
	let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
	mac.update(payload);
	hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
	use super::*;
	use flare_core::{AlertCondition, AlertSeverity, TrackerConfigLayer};

	fn rule_with_channels(channels: Vec<ChannelKind>) -> AlertRule {
		AlertRule {
			id: "r1".to_string(),
			name: "High error rate".to_string(),
			condition: AlertCondition::default(),
			severity: AlertSeverity::Critical,
			channels,
			enabled: true,
		}
	}

	#[test]
	fn sign_payload_is_hex_sha256() {
		let sig = sign_payload(b"secret", b"payload");
		assert_eq!(sig.len(), 64);
		assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
		// Stable for identical inputs.
		assert_eq!(sig, sign_payload(b"secret", b"payload"));
		assert_ne!(sig, sign_payload(b"other", b"payload"));
	}

	#[tokio::test]
	async fn unconfigured_channels_are_silently_skipped() {
		// No endpoint, chat and webhook disabled: every send is a no-op and
		// nothing panics or errors out of the dispatcher.
		let dispatcher = DeliveryDispatcher::new(Duration::from_secs(1));
		let config = TrackerConfigLayer::default().finalize();
		let event = ErrorEvent::default();
		let rule = rule_with_channels(vec![
			ChannelKind::Collector,
			ChannelKind::Chat,
			ChannelKind::Webhook,
		]);

		dispatcher.deliver_event(&config, &event).await;
		dispatcher.deliver_alert(&config, &rule, &event).await;
	}

	#[tokio::test]
	async fn failed_delivery_does_not_propagate() {
		// Unroutable endpoint: the request fails and is swallowed.
		let dispatcher = DeliveryDispatcher::new(Duration::from_millis(100));
		let config = TrackerConfigLayer {
			endpoint: Some("http://127.0.0.1:1".to_string()),
			..Default::default()
		}
		.finalize();
		let event = ErrorEvent::default();

		dispatcher.deliver_event(&config, &event).await;
	}
}
