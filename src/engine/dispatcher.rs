// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The shotgun dispatcher: one job, N providers, all at once.
//!
//! ## Algorithm
//! 1. Spawn one task per resolved provider. Each task races the provider call
//!    against its own per-call timeout (`min(provider timeout, override)`) and
//!    the batch cancellation token.
//! 2. Join tasks in completion order until every one is terminal or the batch
//!    deadline passes.
//! 3. At the deadline cancel the batch token, abort the remaining tasks and
//!    record each of them as `Cancelled`.
//!
//! Provider failures, timeouts and panics are turned into outcomes at the
//! unit boundary. The only error a round can return is [`DispatchError`],
//! raised when there is no runtime to spawn units on.
//!
//! ## Example
//! ```rust
//! use masq::engine::{Job, ShotgunDispatcher};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//! let dispatcher = ShotgunDispatcher::new();
//! let report = runtime
//!     .block_on(dispatcher.run(Job::new(vec![1, 2, 3]), &[]))
//!     .unwrap();
//! assert!(report.is_useless());
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::consts::DEFAULT_MIN_SUCCESSFUL;
use crate::config::{ProviderRegistry, ShotgunOptions};
use crate::engine::{Job, JobResult, OutcomeStatus, TaskOutcome};
use crate::errors::{DispatchError, ProviderError};
use crate::observability::messages::dispatch::{
    BatchDeadlineReached, DispatchCompleted, DispatchStarted, EmptyProviderSet, MinSuccessfulNotMet,
};
use crate::observability::messages::provider::{ProviderCompleted, ProviderFailed, ProviderPanicked};
use crate::observability::messages::StructuredLog;
use crate::traits::ResolvedProvider;
use crate::utils::join_error_message;

/// Concurrent fan-out of one job to many providers.
///
/// Cheap to clone; holds only policy.
#[derive(Debug, Clone)]
pub struct ShotgunDispatcher {
    per_call_override: Option<Duration>,
    min_successful: usize,
}

impl Default for ShotgunDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ShotgunDispatcher {
    pub fn new() -> Self {
        Self {
            per_call_override: None,
            min_successful: DEFAULT_MIN_SUCCESSFUL,
        }
    }

    pub fn from_options(options: &ShotgunOptions) -> Self {
        Self {
            per_call_override: options.per_call_override(),
            min_successful: options.min_successful(),
        }
    }

    /// Cap every provider's own timeout.
    pub fn with_per_call_timeout(mut self, cap: Option<Duration>) -> Self {
        self.per_call_override = cap;
        self
    }

    /// Advisory threshold; a round below it is logged, never failed.
    pub fn with_min_successful(mut self, min_successful: usize) -> Self {
        self.min_successful = min_successful;
        self
    }

    /// Run `job` against `providers`, bounded by the job's own deadline.
    pub async fn run(&self, job: Job, providers: &[ResolvedProvider]) -> Result<JobResult, DispatchError> {
        let batch_timeout = job.deadline;
        self.dispatch(job, providers, self.per_call_override, batch_timeout, None)
            .await
    }

    /// Same as [`run`](Self::run) with explicit per-call and batch bounds.
    pub async fn run_with_timeouts(
        &self,
        job: Job,
        providers: &[ResolvedProvider],
        per_call_override: Option<Duration>,
        batch_timeout: Duration,
    ) -> Result<JobResult, DispatchError> {
        self.dispatch(job, providers, per_call_override, batch_timeout, None)
            .await
    }

    /// Same as [`run`](Self::run), also sending every outcome to `observer`
    /// the moment it is recorded. The sender is dropped when the round ends.
    pub async fn run_observed(
        &self,
        job: Job,
        providers: &[ResolvedProvider],
        observer: mpsc::UnboundedSender<TaskOutcome>,
    ) -> Result<JobResult, DispatchError> {
        let batch_timeout = job.deadline;
        self.dispatch(job, providers, self.per_call_override, batch_timeout, Some(&observer))
            .await
    }

    /// Resolve the job's requested providers through `registry`, then run it.
    pub async fn run_with_registry(&self, job: Job, registry: &ProviderRegistry) -> Result<JobResult, DispatchError> {
        let providers = registry.resolve(&job.requested);
        self.run(job, &providers).await
    }

    async fn dispatch(
        &self,
        job: Job,
        providers: &[ResolvedProvider],
        per_call_override: Option<Duration>,
        batch_timeout: Duration,
        observer: Option<&mpsc::UnboundedSender<TaskOutcome>>,
    ) -> Result<JobResult, DispatchError> {
        tokio::runtime::Handle::try_current().map_err(|e| DispatchError::NoRuntime(e.to_string()))?;

        if providers.is_empty() {
            EmptyProviderSet { job_id: job.id }.log();
            return Ok(JobResult::empty(job.id));
        }

        let start_msg = DispatchStarted {
            job_id: job.id,
            provider_count: providers.len(),
            batch_timeout,
        };
        let span = start_msg.span("shotgun");
        start_msg.log();

        let report = self
            .fan_out(job, providers, per_call_override, batch_timeout, observer)
            .instrument(span)
            .await;

        DispatchCompleted {
            job_id: report.job_id(),
            successful: report.success_count(),
            total: report.results().len(),
            elapsed: report.total_elapsed(),
            total_cost: report.total_cost(),
        }
        .log();

        if report.success_count() < self.min_successful {
            MinSuccessfulNotMet {
                job_id: report.job_id(),
                successful: report.success_count(),
                min_successful: self.min_successful,
            }
            .log();
        }

        Ok(report)
    }

    async fn fan_out(
        &self,
        job: Job,
        providers: &[ResolvedProvider],
        per_call_override: Option<Duration>,
        batch_timeout: Duration,
        observer: Option<&mpsc::UnboundedSender<TaskOutcome>>,
    ) -> JobResult {
        let started = Instant::now();
        // A batch timeout too large to fit in an Instant means no deadline.
        let deadline = started.checked_add(batch_timeout);
        let batch = CancellationToken::new();

        let mut units = JoinSet::new();
        let mut task_index = HashMap::with_capacity(providers.len());
        for (index, provider) in providers.iter().enumerate() {
            let timeout = match per_call_override {
                Some(cap) => provider.spec.per_call_timeout.min(cap),
                None => provider.spec.per_call_timeout,
            };
            let unit = run_unit(
                index,
                provider.clone(),
                Arc::clone(&job.payload),
                batch.child_token(),
                timeout,
            );
            let handle = units.spawn(unit.in_current_span());
            task_index.insert(handle.id(), index);
        }

        let mut results = Vec::with_capacity(providers.len());
        let mut terminal = vec![false; providers.len()];

        loop {
            let joined = match deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, units.join_next()).await,
                None => Ok(units.join_next().await),
            };
            match joined {
                Ok(Some(Ok((index, outcome)))) => {
                    terminal[index] = true;
                    record(&mut results, observer, outcome);
                }
                // The unit's own start time died with it; units are spawned
                // together, so the batch clock stands in for it.
                Ok(Some(Err(join_error))) => {
                    let Some(&index) = task_index.get(&join_error.id()) else {
                        continue;
                    };
                    terminal[index] = true;
                    let provider_id = providers[index].id();
                    let reason = join_error_message(join_error);
                    ProviderPanicked {
                        provider_id,
                        reason: &reason,
                    }
                    .log();
                    let outcome = TaskOutcome::failure(
                        provider_id,
                        OutcomeStatus::Failed,
                        format!("provider panicked: {}", reason),
                        started.elapsed(),
                    );
                    record(&mut results, observer, outcome);
                }
                Ok(None) => break,
                Err(_) => {
                    batch.cancel();
                    units.abort_all();

                    let pending: Vec<String> = providers
                        .iter()
                        .zip(&terminal)
                        .filter(|(_, done)| !**done)
                        .map(|(provider, _)| provider.id().to_string())
                        .collect();
                    BatchDeadlineReached {
                        job_id: job.id,
                        batch_timeout,
                        pending: &pending,
                    }
                    .log();

                    let elapsed = started.elapsed();
                    for provider_id in pending {
                        record(&mut results, observer, TaskOutcome::cancelled(provider_id, elapsed));
                    }
                    break;
                }
            }
        }

        JobResult::new(job.id, results, started.elapsed())
    }
}

/// One provider call, converted to an outcome whatever happens.
async fn run_unit(
    index: usize,
    provider: ResolvedProvider,
    payload: Arc<[u8]>,
    cancel: CancellationToken,
    timeout: Duration,
) -> (usize, TaskOutcome) {
    let started = Instant::now();
    let call = provider.provider.process_detailed(payload, cancel.clone());

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProviderError::Cancelled),
        finished = tokio::time::timeout(timeout, call) => {
            finished.unwrap_or(Err(ProviderError::Timeout(timeout)))
        }
    };

    let elapsed = started.elapsed();
    let outcome = match result {
        Ok(output) => TaskOutcome::success(provider.id(), output.bytes, elapsed, provider.spec.unit_cost)
            .with_metadata(output.metadata),
        Err(error) => TaskOutcome::from_error(provider.id(), &error, elapsed),
    };
    (index, outcome)
}

fn record(
    results: &mut Vec<TaskOutcome>,
    observer: Option<&mpsc::UnboundedSender<TaskOutcome>>,
    outcome: TaskOutcome,
) {
    match outcome.error() {
        None => ProviderCompleted {
            provider_id: outcome.provider_id(),
            status: outcome.status().as_str(),
            elapsed: outcome.elapsed(),
        }
        .log(),
        Some(error) => ProviderFailed {
            provider_id: outcome.provider_id(),
            status: outcome.status().as_str(),
            error,
        }
        .log(),
    }

    if let Some(observer) = observer {
        // A closed receiver only means nobody is watching any more.
        let _ = observer.send(outcome.clone());
    }
    results.push(outcome);
}
