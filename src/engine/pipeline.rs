// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Two-stage pipeline: background removal fan-out, then one upscale round per
//! successful removal.
//!
//! Stage 2 is data dependent. Each upscale round starts as soon as its own
//! stage-1 outcome is recorded, not when stage 1 as a whole finishes, and the
//! rounds run concurrently with each other and with the rest of stage 1.
//!
//! [`PipelineComposer::run_upscale_only`] skips removal and upscales the input
//! itself, keyed as `"original"`.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::Instrument;

use crate::backends::local::{CpuPool, TransformProvider};
use crate::config::consts::{MAX_SCALE, MIN_SCALE, ORIGINAL_SOURCE_ID, TRANSFORM_PROVIDER_ID};
use crate::config::{Config, ProviderRegistry, UpscaleOptions};
use crate::engine::{Job, JobResult, JobSummary, ShotgunDispatcher, TaskOutcome};
use crate::errors::DispatchError;
use crate::observability::messages::pipeline::{PipelineCompleted, PipelineStarted, StageTwoStarted};
use crate::observability::messages::StructuredLog;
use crate::traits::{ProviderSpec, ResolvedProvider};
use crate::utils::join_error_message;

/// Stage-1 report plus one stage-2 report per successful stage-1 provider.
/// Without background removal there is no stage-1 report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    stage1: Option<JobResult>,
    stage2: BTreeMap<String, JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upscale_scale: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_removal: Option<JobSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upscale: Option<UpscaleSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpscaleSummary {
    pub scale: u32,
    pub rounds: usize,
    pub successful: usize,
    #[serde(rename = "total_time_ms", with = "crate::utils::serialization::duration_ms")]
    pub total_elapsed: Duration,
}

impl PipelineResult {
    pub fn stage1(&self) -> Option<&JobResult> {
        self.stage1.as_ref()
    }

    pub fn stage2(&self) -> &BTreeMap<String, JobResult> {
        &self.stage2
    }

    /// The upscaled result derived from `provider_id`'s removal, if any.
    pub fn upscaled(&self, provider_id: &str) -> Option<&TaskOutcome> {
        self.stage2
            .get(provider_id)
            .and_then(|round| round.results().first())
    }

    pub fn total_cost(&self) -> f64 {
        self.stage1.iter().chain(self.stage2.values()).map(JobResult::total_cost).sum()
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary {
            background_removal: self.stage1.as_ref().map(JobResult::summary),
            upscale: self.upscale_scale.map(|scale| UpscaleSummary {
                scale,
                rounds: self.stage2.len(),
                successful: self.stage2.values().map(JobResult::success_count).sum(),
                total_elapsed: self.stage2.values().map(JobResult::total_elapsed).sum(),
            }),
        }
    }
}

/// Sequences a removal round and the per-result upscale rounds.
pub struct PipelineComposer {
    dispatcher: ShotgunDispatcher,
    registry: Arc<ProviderRegistry>,
    transform_pool: CpuPool,
    upscale: UpscaleOptions,
    batch_slack: Duration,
}

impl PipelineComposer {
    pub fn new(
        dispatcher: ShotgunDispatcher,
        registry: Arc<ProviderRegistry>,
        transform_pool: CpuPool,
        upscale: UpscaleOptions,
        batch_slack: Duration,
    ) -> Self {
        Self {
            dispatcher,
            registry,
            transform_pool,
            upscale,
            batch_slack,
        }
    }

    pub fn from_config(config: &Config, registry: Arc<ProviderRegistry>, transform_pool: CpuPool) -> Self {
        Self::new(
            ShotgunDispatcher::from_options(&config.shotgun),
            registry,
            transform_pool,
            config.upscale.clone(),
            config.shotgun.batch_slack(),
        )
    }

    /// Run stage 1 over `stage1_ids` (empty means the default set) and, when
    /// `do_stage2` is set, upscale every success by `stage2_scale` (or the
    /// configured default).
    pub async fn run_pipeline(
        &self,
        job: Job,
        stage1_ids: &[String],
        do_stage2: bool,
        stage2_scale: Option<u32>,
    ) -> Result<PipelineResult, DispatchError> {
        let providers = self.registry.resolve(stage1_ids);
        let scale = self.effective_scale(stage2_scale);

        let start_msg = PipelineStarted {
            job_id: job.id,
            stage1_providers: providers.len(),
            upscale: do_stage2.then_some(scale),
        };
        let span = start_msg.span("pipeline");
        start_msg.log();

        let started = Instant::now();
        let job_id = job.id;

        let (stage1, stage2) = if do_stage2 {
            self.run_both_stages(job, &providers, scale)
                .instrument(span)
                .await?
        } else {
            let stage1 = self.dispatcher.run(job, &providers).instrument(span).await?;
            (stage1, BTreeMap::new())
        };

        PipelineCompleted {
            job_id,
            stage1_successful: stage1.success_count(),
            stage2_rounds: stage2.len(),
            elapsed: started.elapsed(),
        }
        .log();

        Ok(PipelineResult {
            stage1: Some(stage1),
            stage2,
            upscale_scale: do_stage2.then_some(scale),
        })
    }

    /// Upscale the job's input as-is, with no background removal round.
    pub async fn run_upscale_only(&self, job: Job, scale: Option<u32>) -> Result<PipelineResult, DispatchError> {
        let scale = self.effective_scale(scale);
        let start_msg = PipelineStarted {
            job_id: job.id,
            stage1_providers: 0,
            upscale: Some(scale),
        };
        let span = start_msg.span("pipeline");
        start_msg.log();

        let started = Instant::now();
        let job_id = job.id;
        let upscaler = self.upscaler(scale);
        let round = job.with_deadline(self.round_deadline());
        StageTwoStarted {
            job_id: round.id,
            source_provider: ORIGINAL_SOURCE_ID,
            scale,
        }
        .log();

        let report = self
            .dispatcher
            .run(round, std::slice::from_ref(&upscaler))
            .instrument(span)
            .await?;
        let stage2 = BTreeMap::from([(ORIGINAL_SOURCE_ID.to_string(), report)]);

        PipelineCompleted {
            job_id,
            stage1_successful: 0,
            stage2_rounds: stage2.len(),
            elapsed: started.elapsed(),
        }
        .log();

        Ok(PipelineResult {
            stage1: None,
            stage2,
            upscale_scale: Some(scale),
        })
    }

    fn effective_scale(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or_else(|| self.upscale.default_scale())
            .clamp(MIN_SCALE, MAX_SCALE)
    }

    fn round_deadline(&self) -> Duration {
        self.upscale.timeout().saturating_add(self.batch_slack)
    }

    async fn run_both_stages(
        &self,
        job: Job,
        providers: &[ResolvedProvider],
        scale: u32,
    ) -> Result<(JobResult, BTreeMap<String, JobResult>), DispatchError> {
        let upscaler = self.upscaler(scale);
        let (observer, mut outcomes) = mpsc::unbounded_channel::<TaskOutcome>();

        let stage1 = self.dispatcher.run_observed(job, providers, observer);
        let stage2 = async {
            let mut rounds = JoinSet::new();
            while let Some(outcome) = outcomes.recv().await {
                let Some(payload) = outcome.payload() else {
                    continue;
                };
                let round = Job::new(Arc::clone(payload)).with_deadline(self.round_deadline());
                StageTwoStarted {
                    job_id: round.id,
                    source_provider: outcome.provider_id(),
                    scale,
                }
                .log();

                let dispatcher = self.dispatcher.clone();
                let upscaler = upscaler.clone();
                let source = outcome.provider_id().to_string();
                rounds.spawn(async move {
                    let report = dispatcher.run(round, std::slice::from_ref(&upscaler)).await;
                    (source, report)
                });
            }

            let mut reports = BTreeMap::new();
            while let Some(joined) = rounds.join_next().await {
                let (source, report) = joined.map_err(|e| DispatchError::StageJoin {
                    provider_id: TRANSFORM_PROVIDER_ID.to_string(),
                    reason: join_error_message(e),
                })?;
                reports.insert(source, report?);
            }
            Ok::<_, DispatchError>(reports)
        };

        let (stage1, stage2) = tokio::join!(stage1, stage2);
        Ok((stage1?, stage2?))
    }

    fn upscaler(&self, scale: u32) -> ResolvedProvider {
        ResolvedProvider::new(
            ProviderSpec::local(TRANSFORM_PROVIDER_ID, self.upscale.timeout()),
            Arc::new(TransformProvider::new(scale, true, self.transform_pool.clone())),
        )
    }
}
