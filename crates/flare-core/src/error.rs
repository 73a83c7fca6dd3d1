// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the Flare core crate.

use thiserror::Error;

/// Errors that can occur when working with Flare core types.
#[derive(Debug, Error)]
pub enum FlareError {
	#[error("invalid error level: {0}")]
	InvalidErrorLevel(String),

	#[error("invalid breadcrumb level: {0}")]
	InvalidBreadcrumbLevel(String),

	#[error("invalid breadcrumb type: {0}")]
	InvalidBreadcrumbType(String),

	#[error("invalid alert severity: {0}")]
	InvalidAlertSeverity(String),

	#[error("invalid condition kind: {0}")]
	InvalidConditionKind(String),

	#[error("invalid channel kind: {0}")]
	InvalidChannelKind(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for Flare core operations.
pub type Result<T> = std::result::Result<T, FlareError>;
