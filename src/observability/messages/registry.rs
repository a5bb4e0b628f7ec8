// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for provider registration and resolution.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A provider was added to the registry.
///
/// # Log Level
/// `debug!`
pub struct ProviderRegistered<'a> {
    pub provider_id: &'a str,
    pub category: &'a str,
    pub available: bool,
}

impl Display for ProviderRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let state = if self.available { "available" } else { "unavailable" };
        write!(
            f,
            "Registered {} provider '{}' ({})",
            self.category, self.provider_id, state
        )
    }
}

impl StructuredLog for ProviderRegistered<'_> {
    fn log(&self) {
        tracing::debug!(
            provider_id = self.provider_id,
            category = self.category,
            available = self.available,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "provider_registered",
            span_name = name,
            provider_id = self.provider_id,
        )
    }
}

/// A requested provider id is not registered. The id is skipped.
///
/// # Log Level
/// `warn!`
///
/// # Example
/// ```
/// use masq::observability::messages::registry::ProviderNotFound;
///
/// let msg = ProviderNotFound { provider_id: "ghost" };
/// assert_eq!(msg.to_string(), "Unknown provider 'ghost' requested; skipping");
/// ```
pub struct ProviderNotFound<'a> {
    pub provider_id: &'a str,
}

impl Display for ProviderNotFound<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Unknown provider '{}' requested; skipping", self.provider_id)
    }
}

impl StructuredLog for ProviderNotFound<'_> {
    fn log(&self) {
        tracing::warn!(provider_id = self.provider_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("provider_not_found", span_name = name, provider_id = self.provider_id)
    }
}

/// A requested provider is registered but cannot be dispatched.
///
/// # Log Level
/// `warn!`
pub struct ProviderUnavailable<'a> {
    pub provider_id: &'a str,
    pub reason: &'a str,
}

impl Display for ProviderUnavailable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Provider '{}' is unavailable ({}); skipping",
            self.provider_id, self.reason
        )
    }
}

impl StructuredLog for ProviderUnavailable<'_> {
    fn log(&self) {
        tracing::warn!(provider_id = self.provider_id, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "provider_unavailable",
            span_name = name,
            provider_id = self.provider_id,
        )
    }
}

/// The same provider id appeared twice; only the first is kept.
///
/// # Log Level
/// `warn!`
pub struct DuplicateProvider<'a> {
    pub provider_id: &'a str,
    pub context: &'a str,
}

impl Display for DuplicateProvider<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Provider '{}' appears more than once in {}; keeping the first",
            self.provider_id, self.context
        )
    }
}

impl StructuredLog for DuplicateProvider<'_> {
    fn log(&self) {
        tracing::warn!(provider_id = self.provider_id, context = self.context, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("duplicate_provider", span_name = name, provider_id = self.provider_id)
    }
}

/// A configured provider could not be built and was left out of the registry.
///
/// # Log Level
/// `warn!`
pub struct ProviderSkipped<'a> {
    pub provider_id: &'a str,
    pub reason: &'a str,
}

impl Display for ProviderSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Skipping provider '{}': {}", self.provider_id, self.reason)
    }
}

impl StructuredLog for ProviderSkipped<'_> {
    fn log(&self) {
        tracing::warn!(provider_id = self.provider_id, reason = self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("provider_skipped", span_name = name, provider_id = self.provider_id)
    }
}
