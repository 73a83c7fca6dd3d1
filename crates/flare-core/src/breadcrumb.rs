// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Breadcrumb types: minor events retained to give context before an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FlareError;

/// A breadcrumb representing an action or system event preceding an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Breadcrumb {
	pub timestamp: DateTime<Utc>,
	#[serde(rename = "type")]
	pub kind: BreadcrumbType,
	/// "http", "navigation", "ui", "console"
	pub category: String,
	pub message: Option<String>,
	pub level: BreadcrumbLevel,
	pub data: serde_json::Value,
}

impl Default for Breadcrumb {
	fn default() -> Self {
		Self {
			timestamp: Utc::now(),
			kind: BreadcrumbType::Debug,
			category: String::new(),
			message: None,
			level: BreadcrumbLevel::Info,
			data: serde_json::Value::Object(serde_json::Map::new()),
		}
	}
}

/// Classification of a breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreadcrumbType {
	Navigation,
	User,
	Debug,
	Error,
	Http,
	Console,
}

impl fmt::Display for BreadcrumbType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Navigation => write!(f, "navigation"),
			Self::User => write!(f, "user"),
			Self::Debug => write!(f, "debug"),
			Self::Error => write!(f, "error"),
			Self::Http => write!(f, "http"),
			Self::Console => write!(f, "console"),
		}
	}
}

impl FromStr for BreadcrumbType {
	type Err = FlareError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"navigation" => Ok(Self::Navigation),
			"user" => Ok(Self::User),
			"debug" => Ok(Self::Debug),
			"error" => Ok(Self::Error),
			"http" => Ok(Self::Http),
			"console" => Ok(Self::Console),
			_ => Err(FlareError::InvalidBreadcrumbType(s.to_string())),
		}
	}
}

/// Severity level of a breadcrumb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreadcrumbLevel {
	Debug,
	Info,
	Warning,
	Error,
}

impl fmt::Display for BreadcrumbLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Debug => write!(f, "debug"),
			Self::Info => write!(f, "info"),
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
		}
	}
}

impl FromStr for BreadcrumbLevel {
	type Err = FlareError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"debug" => Ok(Self::Debug),
			"info" => Ok(Self::Info),
			"warning" => Ok(Self::Warning),
			"error" => Ok(Self::Error),
			_ => Err(FlareError::InvalidBreadcrumbLevel(s.to_string())),
		}
	}
}
