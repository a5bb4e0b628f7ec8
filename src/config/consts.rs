use std::time::Duration;

/// Per-call timeout used when a provider does not configure one (120 seconds)
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(120);
/// Slack added on top of the individual timeout to form the batch deadline
pub const DEFAULT_BATCH_SLACK: Duration = Duration::from_secs(30);
/// Batch deadline for a job that does not set one
pub const DEFAULT_BATCH_TIMEOUT: Duration =
    Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT.as_secs() + DEFAULT_BATCH_SLACK.as_secs());

/// Per-call timeout for the synthetic upscale provider (60 seconds)
pub const DEFAULT_TRANSFORM_TIMEOUT: Duration = Duration::from_secs(60);

/// Smallest accepted upscale factor
pub const MIN_SCALE: u32 = 1;
/// Largest accepted upscale factor
pub const MAX_SCALE: u32 = 8;
/// Upscale factor used when none is given
pub const DEFAULT_SCALE: u32 = 4;

/// Local inference worker count; excess requests queue instead of oversubscribing CPU
pub const DEFAULT_INFERENCE_WORKERS: usize = 2;
/// Transform worker count
pub const DEFAULT_TRANSFORM_WORKERS: usize = 2;

/// Successful results below which a shotgun round logs a warning
pub const DEFAULT_MIN_SUCCESSFUL: usize = 1;

/// Delay between status polls for task-queue style backends
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Status polls before a task-queue backend gives up
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

/// Provider id of the synthetic upscale provider used by the pipeline's second stage
pub const TRANSFORM_PROVIDER_ID: &str = "lanczos";
/// Stage-2 key for an upscale of the untouched input
pub const ORIGINAL_SOURCE_ID: &str = "original";
