// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for the Flare error tracking SDK.
//!
//! This crate provides the shared vocabulary of the capture pipeline:
//! captured events with structured exception detail, breadcrumbs, user and
//! request context snapshots, the alert-rule model, layered configuration,
//! and the pure grouping/stack-parsing functions. It contains no I/O; the
//! stateful tracker lives in the `flare` crate.

pub mod alert;
pub mod breadcrumb;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod grouping;
pub mod stacktrace;

pub use alert::{
	AlertCondition, AlertRule, AlertSeverity, ChannelKind, ConditionKind, EscalationLevel,
	EscalationPolicy,
};
pub use breadcrumb::{Breadcrumb, BreadcrumbLevel, BreadcrumbType};
pub use config::{
	AlertingConfig, AlertingLayer, ChatIntegration, FilteringConfig, FilteringLayer,
	GithubIntegration, IntegrationConfig, IntegrationLayer, JiraIntegration, LimitsConfig,
	LimitsLayer, SamplingConfig, SamplingLayer, ThrottlingConfig, ThrottlingLayer, TrackerConfig,
	TrackerConfigLayer, WebhookIntegration,
};
pub use context::{RequestContext, UserContext, UNKNOWN_IP};
pub use error::{FlareError, Result};
pub use event::{
	ErrorEvent, ErrorLevel, EventId, ExceptionInfo, Frame, Mechanism, MechanismKind, Stacktrace,
};
pub use grouping::{fingerprint_digest, grouping_hash};
pub use stacktrace::parse_stack;
