// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

use crate::engine::JobId;

/// Structural failure of a whole dispatch round.
///
/// Per-provider problems never show up here; they become outcomes.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// There is no async runtime to spawn units on.
    #[error("no async runtime available to schedule provider units: {0}")]
    NoRuntime(String),

    /// A pipeline stage task could not be joined.
    #[error("pipeline stage for '{provider_id}' could not be joined: {reason}")]
    StageJoin { provider_id: String, reason: String },
}

/// Rejected selection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("invalid selection of '{provider_id}' for job {job_id}: {reason}")]
    InvalidSelection {
        job_id: JobId,
        provider_id: String,
        reason: SelectionRejection,
    },
}

/// Why a selection was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionRejection {
    /// The provider is unknown to the job or did not succeed.
    NotSuccessful,
    /// The job already has a selection; at most one is allowed.
    AlreadySelected { existing: String },
}

impl fmt::Display for SelectionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionRejection::NotSuccessful => {
                write!(f, "provider has no successful outcome in this job")
            }
            SelectionRejection::AlreadySelected { existing } => {
                write!(f, "job already has a selection ('{}')", existing)
            }
        }
    }
}
