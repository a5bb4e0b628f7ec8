// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for shotgun dispatch rounds.
//!
//! This module contains message types for logging events related to:
//! * Round start and completion
//! * Batch deadline expiry and cancellation of outstanding units
//! * Advisory success thresholds

use crate::engine::JobId;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A round is fanning out to its providers.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use masq::engine::JobId;
/// use masq::observability::messages::dispatch::DispatchStarted;
/// use std::time::Duration;
///
/// let msg = DispatchStarted {
///     job_id: JobId::new(),
///     provider_count: 3,
///     batch_timeout: Duration::from_secs(150),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct DispatchStarted {
    pub job_id: JobId,
    pub provider_count: usize,
    pub batch_timeout: Duration,
}

impl Display for DispatchStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatching job {} to {} providers (batch timeout {:?})",
            self.job_id, self.provider_count, self.batch_timeout
        )
    }
}

impl StructuredLog for DispatchStarted {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            provider_count = self.provider_count,
            batch_timeout_ms = self.batch_timeout.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "dispatch",
            span_name = name,
            job_id = %self.job_id,
            provider_count = self.provider_count,
        )
    }
}

/// Every unit of a round is terminal.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DispatchCompleted {
    pub job_id: JobId,
    pub successful: usize,
    pub total: usize,
    pub elapsed: Duration,
    pub total_cost: f64,
}

impl Display for DispatchCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} finished: {}/{} providers succeeded in {:?} (cost {:.4})",
            self.job_id, self.successful, self.total, self.elapsed, self.total_cost
        )
    }
}

impl StructuredLog for DispatchCompleted {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            successful = self.successful,
            total = self.total,
            elapsed_ms = self.elapsed.as_millis() as u64,
            total_cost = self.total_cost,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "dispatch_completed",
            span_name = name,
            job_id = %self.job_id,
            successful = self.successful,
            total = self.total,
        )
    }
}

/// The batch deadline passed with units still running; they are being cancelled.
///
/// # Log Level
/// `warn!` - Degraded round, results are partial
pub struct BatchDeadlineReached<'a> {
    pub job_id: JobId,
    pub batch_timeout: Duration,
    pub pending: &'a [String],
}

impl Display for BatchDeadlineReached<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} hit its {:?} batch deadline; cancelling {} pending providers: {}",
            self.job_id,
            self.batch_timeout,
            self.pending.len(),
            self.pending.join(", ")
        )
    }
}

impl StructuredLog for BatchDeadlineReached<'_> {
    fn log(&self) {
        tracing::warn!(
            job_id = %self.job_id,
            batch_timeout_ms = self.batch_timeout.as_millis() as u64,
            pending = ?self.pending,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "batch_deadline",
            span_name = name,
            job_id = %self.job_id,
            pending = self.pending.len(),
        )
    }
}

/// Fewer successes than the configured advisory threshold.
///
/// # Log Level
/// `warn!` - The round still returns normally
pub struct MinSuccessfulNotMet {
    pub job_id: JobId,
    pub successful: usize,
    pub min_successful: usize,
}

impl Display for MinSuccessfulNotMet {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Job {} produced {} successful results, below the advisory minimum of {}",
            self.job_id, self.successful, self.min_successful
        )
    }
}

impl StructuredLog for MinSuccessfulNotMet {
    fn log(&self) {
        tracing::warn!(
            job_id = %self.job_id,
            successful = self.successful,
            min_successful = self.min_successful,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "min_successful_not_met",
            span_name = name,
            job_id = %self.job_id,
        )
    }
}

/// Nothing to dispatch; the round returns an empty report.
///
/// # Log Level
/// `warn!`
pub struct EmptyProviderSet {
    pub job_id: JobId,
}

impl Display for EmptyProviderSet {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Job {} has no dispatchable providers", self.job_id)
    }
}

impl StructuredLog for EmptyProviderSet {
    fn log(&self) {
        tracing::warn!(job_id = %self.job_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("empty_provider_set", span_name = name, job_id = %self.job_id)
    }
}
