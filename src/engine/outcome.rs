// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-provider outcomes and the aggregated report of one dispatch round.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::JobId;
use crate::errors::ProviderError;

/// Terminal state of one provider unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failed,
    Timeout,
    Unavailable,
    Cancelled,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeStatus::Success => "success",
            OutcomeStatus::Failed => "failed",
            OutcomeStatus::Timeout => "timeout",
            OutcomeStatus::Unavailable => "unavailable",
            OutcomeStatus::Cancelled => "cancelled",
        }
    }
}

/// Result of one provider for one job. Immutable once built.
///
/// Constructors enforce the invariants: only a success carries a payload and a
/// cost; everything else carries an error message and costs nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskOutcome {
    provider_id: String,
    status: OutcomeStatus,
    #[serde(rename = "image_base64", serialize_with = "crate::utils::serialization::payload_base64::serialize")]
    payload: Option<Arc<[u8]>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(rename = "processing_time_ms", with = "crate::utils::serialization::duration_ms")]
    elapsed: Duration,
    cost: f64,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, serde_json::Value>,
}

impl TaskOutcome {
    pub fn success(
        provider_id: impl Into<String>,
        payload: impl Into<Arc<[u8]>>,
        elapsed: Duration,
        cost: f64,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            status: OutcomeStatus::Success,
            payload: Some(payload.into()),
            error: None,
            elapsed,
            cost,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach provider-reported details (dimensions, scale, ...).
    pub fn with_metadata(mut self, metadata: BTreeMap<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// A non-success outcome. Passing `OutcomeStatus::Success` here is a
    /// programming error and is recorded as `Failed`.
    pub fn failure(
        provider_id: impl Into<String>,
        status: OutcomeStatus,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        let status = if status == OutcomeStatus::Success {
            OutcomeStatus::Failed
        } else {
            status
        };
        Self {
            provider_id: provider_id.into(),
            status,
            payload: None,
            error: Some(error.into()),
            elapsed,
            cost: 0.0,
            metadata: BTreeMap::new(),
        }
    }

    pub fn cancelled(provider_id: impl Into<String>, elapsed: Duration) -> Self {
        Self::failure(
            provider_id,
            OutcomeStatus::Cancelled,
            format!("cancelled at batch deadline after {:?}", elapsed),
            elapsed,
        )
    }

    /// Map a provider error onto its outcome status.
    pub fn from_error(provider_id: impl Into<String>, error: &ProviderError, elapsed: Duration) -> Self {
        let status = match error {
            ProviderError::Failed(_) => OutcomeStatus::Failed,
            ProviderError::Timeout(_) => OutcomeStatus::Timeout,
            ProviderError::Unavailable(_) => OutcomeStatus::Unavailable,
            ProviderError::Cancelled => OutcomeStatus::Cancelled,
        };
        Self::failure(provider_id, status, error.to_string(), elapsed)
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    pub fn payload(&self) -> Option<&Arc<[u8]>> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }
}

/// Aggregated outcomes of one dispatch round, in completion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    job_id: JobId,
    results: Vec<TaskOutcome>,
    #[serde(rename = "total_time_ms", with = "crate::utils::serialization::duration_ms")]
    total_elapsed: Duration,
    total_cost: f64,
}

/// Counts-only view of a `JobResult`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSummary {
    pub total_providers: usize,
    pub successful: usize,
    pub failed: usize,
    #[serde(rename = "total_time_ms", with = "crate::utils::serialization::duration_ms")]
    pub total_elapsed: Duration,
    pub total_cost: f64,
}

impl JobResult {
    /// Build the report for a finished round. Totals are derived from the outcomes.
    pub fn new(job_id: JobId, results: Vec<TaskOutcome>, total_elapsed: Duration) -> Self {
        let total_cost = results.iter().map(TaskOutcome::cost).sum();
        Self {
            job_id,
            results,
            total_elapsed,
            total_cost,
        }
    }

    pub fn empty(job_id: JobId) -> Self {
        Self::new(job_id, Vec::new(), Duration::ZERO)
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn results(&self) -> &[TaskOutcome] {
        &self.results
    }

    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    pub fn successful(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn outcome(&self, provider_id: &str) -> Option<&TaskOutcome> {
        self.results.iter().find(|r| r.provider_id == provider_id)
    }

    /// Nothing usable came back. Reported, never raised.
    pub fn is_useless(&self) -> bool {
        self.success_count() == 0
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            total_providers: self.results.len(),
            successful: self.success_count(),
            failed: self.failure_count(),
            total_elapsed: self.total_elapsed,
            total_cost: self.total_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_outcomes_never_cost_anything() {
        let outcome = TaskOutcome::failure("p", OutcomeStatus::Failed, "boom", Duration::from_millis(5));
        assert_eq!(outcome.cost(), 0.0);
        assert!(outcome.payload().is_none());
        assert_eq!(outcome.error(), Some("boom"));
    }

    #[test]
    fn test_failure_constructor_refuses_success_status() {
        let outcome = TaskOutcome::failure("p", OutcomeStatus::Success, "nope", Duration::ZERO);
        assert_eq!(outcome.status(), OutcomeStatus::Failed);
    }

    #[test]
    fn test_from_error_maps_statuses() {
        let cases = vec![
            (ProviderError::failed("x"), OutcomeStatus::Failed),
            (ProviderError::Timeout(Duration::from_secs(1)), OutcomeStatus::Timeout),
            (ProviderError::Unavailable("no key".into()), OutcomeStatus::Unavailable),
            (ProviderError::Cancelled, OutcomeStatus::Cancelled),
        ];
        for (error, expected) in cases {
            let outcome = TaskOutcome::from_error("p", &error, Duration::ZERO);
            assert_eq!(outcome.status(), expected, "for {:?}", error);
            assert_eq!(outcome.cost(), 0.0);
        }
    }

    #[test]
    fn test_job_result_counts_and_cost() {
        let results = vec![
            TaskOutcome::success("a", vec![1u8], Duration::from_millis(10), 0.5),
            TaskOutcome::failure("b", OutcomeStatus::Timeout, "slow", Duration::from_millis(20)),
            TaskOutcome::success("c", vec![2u8], Duration::from_millis(30), 0.25),
        ];
        let report = JobResult::new(JobId::new(), results, Duration::from_millis(30));

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.success_count() + report.failure_count(), report.results().len());
        assert!((report.total_cost() - 0.75).abs() < f64::EPSILON);
        assert!(!report.is_useless());
        assert_eq!(report.outcome("b").map(|o| o.status()), Some(OutcomeStatus::Timeout));
    }

    #[test]
    fn test_empty_result_is_useless_but_valid() {
        let report = JobResult::empty(JobId::new());
        assert_eq!(report.results().len(), 0);
        assert!(report.is_useless());
        assert_eq!(report.summary().total_providers, 0);
    }

    #[test]
    fn test_report_serializes_payload_and_summary_fields() {
        let report = JobResult::new(
            JobId::new(),
            vec![TaskOutcome::success("a", b"hi".to_vec(), Duration::from_millis(2), 0.1)],
            Duration::from_millis(2),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["results"][0]["provider_id"], "a");
        assert_eq!(json["results"][0]["status"], "success");
        assert_eq!(json["results"][0]["image_base64"], "aGk=");
        assert!(json["results"][0].get("error").is_none());
        assert!(json["results"][0].get("metadata").is_none());
        assert_eq!(json["total_time_ms"], 2.0);
    }

    #[test]
    fn test_metadata_is_serialized_when_present() {
        let outcome = TaskOutcome::success("upscaler", vec![1u8], Duration::ZERO, 0.0)
            .with_metadata(BTreeMap::from([("has_alpha".to_string(), serde_json::Value::Bool(true))]));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["metadata"]["has_alpha"], true);
    }
}
