// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ranking of successful outcomes and the "pick one" contract.
//!
//! The selector knows nothing about how choices are shown. A front end calls
//! [`ResultSelector::present`] to get the candidates in display order and
//! [`ResultSelector::record`] once the user has chosen. A job gets at most
//! one selection.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use crate::config::ProviderRegistry;
use crate::engine::{JobId, JobResult, TaskOutcome};
use crate::errors::{SelectionError, SelectionRejection};
use crate::observability::messages::pipeline::SelectionRecorded;
use crate::observability::messages::StructuredLog;

/// A caller's terminal choice for one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    job_id: JobId,
    provider_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

impl Selection {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct ResultSelector {
    priorities: HashMap<String, u32>,
    selections: Mutex<HashMap<JobId, Selection>>,
}

impl ResultSelector {
    pub fn new(priorities: HashMap<String, u32>) -> Self {
        Self {
            priorities,
            selections: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_registry(registry: &ProviderRegistry) -> Self {
        Self::new(registry.priorities())
    }

    /// Successful outcomes by provider priority (lower first). Equal
    /// priorities keep completion order; unknown providers sort last.
    pub fn present<'a>(&self, result: &'a JobResult) -> Vec<&'a TaskOutcome> {
        let mut candidates: Vec<&TaskOutcome> = result.successful().collect();
        candidates.sort_by_key(|outcome| self.priority(outcome.provider_id()));
        candidates
    }

    fn priority(&self, provider_id: &str) -> u32 {
        self.priorities.get(provider_id).copied().unwrap_or(u32::MAX)
    }

    /// Record the caller's choice of `provider_id` for `result`'s job.
    pub fn record(
        &self,
        result: &JobResult,
        provider_id: &str,
        notes: Option<String>,
    ) -> Result<Selection, SelectionError> {
        let reject = |reason| SelectionError::InvalidSelection {
            job_id: result.job_id(),
            provider_id: provider_id.to_string(),
            reason,
        };

        if !result.outcome(provider_id).is_some_and(TaskOutcome::is_success) {
            return Err(reject(SelectionRejection::NotSuccessful));
        }

        let mut selections = self.selections.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = selections.get(&result.job_id()) {
            return Err(reject(SelectionRejection::AlreadySelected {
                existing: existing.provider_id.clone(),
            }));
        }

        let selection = Selection {
            job_id: result.job_id(),
            provider_id: provider_id.to_string(),
            notes,
        };
        selections.insert(selection.job_id, selection.clone());
        drop(selections);

        SelectionRecorded {
            job_id: selection.job_id,
            provider_id: &selection.provider_id,
            notes: selection.notes(),
        }
        .log();

        Ok(selection)
    }

    pub fn selection(&self, job_id: JobId) -> Option<Selection> {
        self.selections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&job_id)
            .cloned()
    }
}
