// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for provider units and the local execution machinery.
//!
//! This module contains message types for logging events related to:
//! * Individual provider calls (completion, failure, timeout, panic)
//! * Local model session loading
//! * Polling of task-queue style remote backends

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A provider unit reached a terminal state.
///
/// # Log Level
/// `debug!` - Per-unit detail; the round summary is logged at info
///
/// # Example
/// ```
/// use masq::observability::messages::provider::ProviderCompleted;
/// use std::time::Duration;
///
/// let msg = ProviderCompleted {
///     provider_id: "local_isnet",
///     status: "success",
///     elapsed: Duration::from_millis(420),
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ProviderCompleted<'a> {
    pub provider_id: &'a str,
    pub status: &'a str,
    pub elapsed: Duration,
}

impl Display for ProviderCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Provider '{}' finished with status {} in {:?}",
            self.provider_id, self.status, self.elapsed
        )
    }
}

impl StructuredLog for ProviderCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            provider_id = self.provider_id,
            status = self.status,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "provider_completed",
            span_name = name,
            provider_id = self.provider_id,
            status = self.status,
        )
    }
}

/// A provider unit ended in a non-success state.
///
/// # Log Level
/// `warn!` - Partial failure; the round continues
pub struct ProviderFailed<'a> {
    pub provider_id: &'a str,
    pub status: &'a str,
    pub error: &'a str,
}

impl Display for ProviderFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Provider '{}' ended with {}: {}",
            self.provider_id, self.status, self.error
        )
    }
}

impl StructuredLog for ProviderFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            provider_id = self.provider_id,
            status = self.status,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "provider_failed",
            span_name = name,
            provider_id = self.provider_id,
            status = self.status,
        )
    }
}

/// A provider task panicked. The panic is contained to its unit.
///
/// # Log Level
/// `error!` - Bug in a provider implementation
pub struct ProviderPanicked<'a> {
    pub provider_id: &'a str,
    pub reason: &'a str,
}

impl Display for ProviderPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Provider '{}' panicked: {}", self.provider_id, self.reason)
    }
}

impl StructuredLog for ProviderPanicked<'_> {
    fn log(&self) {
        tracing::error!(
            provider_id = self.provider_id,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "provider_panicked",
            span_name = name,
            provider_id = self.provider_id,
        )
    }
}

/// A local model session finished loading and is now cached.
///
/// # Log Level
/// `info!` - Happens once per model per process
pub struct SessionLoaded<'a> {
    pub model_id: &'a str,
    pub elapsed: Duration,
}

impl Display for SessionLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loaded model session '{}' in {:?}", self.model_id, self.elapsed)
    }
}

impl StructuredLog for SessionLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            model_id = self.model_id,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("session_loaded", span_name = name, model_id = self.model_id)
    }
}

/// A local model session could not be loaded. The next request retries.
///
/// # Log Level
/// `error!`
pub struct SessionLoadFailed<'a> {
    pub model_id: &'a str,
    pub error: &'a str,
}

impl Display for SessionLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to load model session '{}': {}", self.model_id, self.error)
    }
}

impl StructuredLog for SessionLoadFailed<'_> {
    fn log(&self) {
        tracing::error!(model_id = self.model_id, error = self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("session_load_failed", span_name = name, model_id = self.model_id)
    }
}

/// A task was accepted by a polling backend.
///
/// # Log Level
/// `debug!`
pub struct TaskSubmitted<'a> {
    pub model_id: &'a str,
    pub task_id: &'a str,
}

impl Display for TaskSubmitted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Submitted task {} for model '{}'", self.task_id, self.model_id)
    }
}

impl StructuredLog for TaskSubmitted<'_> {
    fn log(&self) {
        tracing::debug!(model_id = self.model_id, task_id = self.task_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "task",
            span_name = name,
            model_id = self.model_id,
            task_id = self.task_id,
        )
    }
}

/// A polling backend ran out of status checks.
///
/// # Log Level
/// `warn!`
pub struct PollingExhausted<'a> {
    pub task_id: &'a str,
    pub attempts: u32,
}

impl Display for PollingExhausted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task {} still pending after {} status checks",
            self.task_id, self.attempts
        )
    }
}

impl StructuredLog for PollingExhausted<'_> {
    fn log(&self) {
        tracing::warn!(task_id = self.task_id, attempts = self.attempts, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("polling_exhausted", span_name = name, task_id = self.task_id)
    }
}
