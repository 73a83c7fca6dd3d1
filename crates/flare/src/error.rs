// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Flare SDK.
//!
//! Capture-path operations never surface these to the host; they exist for
//! the delivery layer and for export, where a serialization failure is the
//! only realistic error.

use thiserror::Error;

/// Result type alias for SDK operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors that can occur inside the SDK.
#[derive(Debug, Error)]
pub enum TrackerError {
	/// HTTP request failed.
	#[error("HTTP request failed: {0}")]
	RequestFailed(#[from] reqwest::Error),

	/// Delivery target returned a non-success status.
	#[error("delivery failed (status {status}): {message}")]
	DeliveryFailed {
		/// HTTP status code.
		status: u16,
		/// Response body, if readable.
		message: String,
	},

	/// A channel was asked to deliver without the required configuration.
	#[error("channel {0} is not configured")]
	ChannelUnconfigured(&'static str),

	/// Failed to serialize a payload.
	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}
