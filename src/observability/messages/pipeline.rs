// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the two-stage pipeline and result selection.

use crate::engine::JobId;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// A pipeline run is starting.
///
/// # Log Level
/// `info!`
///
/// # Example
/// ```
/// use masq::engine::JobId;
/// use masq::observability::messages::pipeline::PipelineStarted;
///
/// let msg = PipelineStarted {
///     job_id: JobId::new(),
///     stage1_providers: 4,
///     upscale: Some(4),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct PipelineStarted {
    pub job_id: JobId,
    pub stage1_providers: usize,
    pub upscale: Option<u32>,
}

impl Display for PipelineStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.upscale {
            Some(scale) => write!(
                f,
                "Pipeline {} started: {} removal providers, then {}x upscale per result",
                self.job_id, self.stage1_providers, scale
            ),
            None => write!(
                f,
                "Pipeline {} started: {} removal providers, no upscale",
                self.job_id, self.stage1_providers
            ),
        }
    }
}

impl StructuredLog for PipelineStarted {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            stage1_providers = self.stage1_providers,
            upscale = ?self.upscale,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "pipeline",
            span_name = name,
            job_id = %self.job_id,
            upscale = ?self.upscale,
        )
    }
}

/// A stage-1 success is being fed into its own stage-2 round.
///
/// # Log Level
/// `debug!`
pub struct StageTwoStarted<'a> {
    pub job_id: JobId,
    pub source_provider: &'a str,
    pub scale: u32,
}

impl Display for StageTwoStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Upscaling result of '{}' by {}x (stage-2 job {})",
            self.source_provider, self.scale, self.job_id
        )
    }
}

impl StructuredLog for StageTwoStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            job_id = %self.job_id,
            source_provider = self.source_provider,
            scale = self.scale,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage2",
            span_name = name,
            job_id = %self.job_id,
            source_provider = self.source_provider,
        )
    }
}

/// A pipeline run finished.
///
/// # Log Level
/// `info!`
pub struct PipelineCompleted {
    pub job_id: JobId,
    pub stage1_successful: usize,
    pub stage2_rounds: usize,
    pub elapsed: Duration,
}

impl Display for PipelineCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline {} completed: {} removal results, {} upscale rounds in {:?}",
            self.job_id, self.stage1_successful, self.stage2_rounds, self.elapsed
        )
    }
}

impl StructuredLog for PipelineCompleted {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            stage1_successful = self.stage1_successful,
            stage2_rounds = self.stage2_rounds,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("pipeline_completed", span_name = name, job_id = %self.job_id)
    }
}

/// A caller picked one result. This is the analytics hook for selections.
///
/// # Log Level
/// `info!`
pub struct SelectionRecorded<'a> {
    pub job_id: JobId,
    pub provider_id: &'a str,
    pub notes: Option<&'a str>,
}

impl Display for SelectionRecorded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Job {} selected '{}'", self.job_id, self.provider_id)?;
        if let Some(notes) = self.notes {
            write!(f, " ({})", notes)?;
        }
        Ok(())
    }
}

impl StructuredLog for SelectionRecorded<'_> {
    fn log(&self) {
        tracing::info!(
            job_id = %self.job_id,
            provider_id = self.provider_id,
            notes = self.notes,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "selection",
            span_name = name,
            job_id = %self.job_id,
            provider_id = self.provider_id,
        )
    }
}
