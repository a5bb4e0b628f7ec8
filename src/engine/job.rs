// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::consts::DEFAULT_BATCH_TIMEOUT;

/// Identifier for one dispatch round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for JobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One request to process a payload with a set of providers.
///
/// A job is consumed by the dispatcher run that executes it. The payload is
/// reference counted so each provider unit can hold it without copying.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub payload: Arc<[u8]>,
    /// Requested provider ids; empty means "the configured default set".
    pub requested: Vec<String>,
    /// Batch deadline for the whole fan-out round.
    pub deadline: Duration,
}

impl Job {
    pub fn new(payload: impl Into<Arc<[u8]>>) -> Self {
        Self {
            id: JobId::new(),
            payload: payload.into(),
            requested: Vec::new(),
            deadline: DEFAULT_BATCH_TIMEOUT,
        }
    }

    pub fn with_providers<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requested = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }
}
