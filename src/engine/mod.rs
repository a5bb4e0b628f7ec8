// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod dispatcher;
pub mod job;
pub mod outcome;
pub mod pipeline;
pub mod selector;
#[cfg(test)]
mod integration_tests;

pub use dispatcher::ShotgunDispatcher;
pub use job::{Job, JobId};
pub use outcome::{JobResult, JobSummary, OutcomeStatus, TaskOutcome};
pub use pipeline::{PipelineComposer, PipelineResult, PipelineSummary, UpscaleSummary};
pub use selector::{ResultSelector, Selection};
