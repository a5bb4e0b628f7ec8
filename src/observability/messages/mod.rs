// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `dispatch` - shotgun round lifecycle events
//! * `provider` - provider unit, worker pool and session cache events
//! * `registry` - provider registration and resolution warnings
//! * `pipeline` - pipeline stages and selections
//!
//! # Usage Pattern
//!
//! ```rust
//! use masq::engine::JobId;
//! use masq::observability::messages::{dispatch::EmptyProviderSet, StructuredLog};
//!
//! let msg = EmptyProviderSet { job_id: JobId::new() };
//! tracing::warn!("{}", msg);
//! msg.log();
//! ```

use tracing::Span;

pub mod dispatch;
pub mod pipeline;
pub mod provider;
pub mod registry;

/// A message that knows how to log itself with structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event at its documented level.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
