// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::config::consts::{
    DEFAULT_BATCH_SLACK, DEFAULT_INFERENCE_WORKERS, DEFAULT_MIN_SUCCESSFUL,
    DEFAULT_PROVIDER_TIMEOUT, DEFAULT_SCALE, DEFAULT_TRANSFORM_TIMEOUT,
    DEFAULT_TRANSFORM_WORKERS,
};
use crate::errors::ConfigError;
use crate::traits::{ProviderCategory, ProviderSpec};

/// Top-level configuration for the shotgun engine.
///
/// Loaded from a YAML or TOML file. Every section is optional and falls back
/// to the constants in [`crate::config::consts`].
///
/// # Example
/// ```yaml
/// shotgun:
///   default_providers: [runware_rmbg2, local_isnet]
///   batch_slack_secs: 30
///   min_successful: 1
/// workers:
///   inference: 2
/// upscale:
///   default_scale: 4
/// providers:
///   - id: runware_rmbg2
///     name: RMBG 2.0
///     category: remote_paid
///     credential: RUNWARE_API_KEY
///     cost: 0.0006
///     priority: 1
///     backend:
///       type: remote
///       client: runware
///       model_id: "runware:110@1"
///   - id: local_isnet
///     category: local_free
///     priority: 5
///     backend:
///       type: local_inference
///       model_id: isnet-general-use
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub shotgun: ShotgunOptions,
    #[serde(default)]
    pub workers: WorkerOptions,
    #[serde(default)]
    pub upscale: UpscaleOptions,
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

/// Fan-out policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShotgunOptions {
    /// Providers used when a job does not name any. Empty means "all available".
    #[serde(default)]
    pub default_providers: Vec<String>,
    /// Caps every provider's own timeout when set
    pub per_call_timeout_secs: Option<u64>,
    /// Slack between the longest individual timeout and the batch deadline
    pub batch_slack_secs: Option<u64>,
    /// Advisory threshold; a round below it is logged, not failed
    pub min_successful: Option<usize>,
}

impl ShotgunOptions {
    pub fn per_call_override(&self) -> Option<Duration> {
        self.per_call_timeout_secs.map(Duration::from_secs)
    }

    pub fn batch_slack(&self) -> Duration {
        self.batch_slack_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_BATCH_SLACK)
    }

    pub fn min_successful(&self) -> usize {
        self.min_successful.unwrap_or(DEFAULT_MIN_SUCCESSFUL)
    }

    /// Batch deadline for a round whose slowest provider allows `longest`.
    pub fn batch_timeout(&self, longest: Duration) -> Duration {
        let longest = match self.per_call_override() {
            Some(cap) => longest.min(cap),
            None => longest,
        };
        longest.saturating_add(self.batch_slack())
    }
}

/// Sizes of the bounded CPU pools.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerOptions {
    pub inference: Option<usize>,
    pub transform: Option<usize>,
}

impl WorkerOptions {
    pub fn inference_workers(&self) -> usize {
        self.inference.unwrap_or(DEFAULT_INFERENCE_WORKERS)
    }

    pub fn transform_workers(&self) -> usize {
        self.transform.unwrap_or(DEFAULT_TRANSFORM_WORKERS)
    }
}

/// Second pipeline stage settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpscaleOptions {
    pub default_scale: Option<u32>,
    pub timeout_secs: Option<u64>,
}

impl UpscaleOptions {
    pub fn default_scale(&self) -> u32 {
        self.default_scale.unwrap_or(DEFAULT_SCALE)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TRANSFORM_TIMEOUT)
    }
}

/// One configured provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    pub id: String,
    pub name: Option<String>,
    pub category: ProviderCategory,
    /// Name of the credential (environment variable) a remote provider needs
    pub credential: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub cost: f64,
    #[serde(default = "default_priority")]
    pub priority: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub notes: Option<String>,
    pub backend: BackendConfig,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        self.timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_PROVIDER_TIMEOUT)
    }

    /// Freeze this entry into a spec; availability is decided by the caller.
    pub fn to_spec(&self, available: bool) -> ProviderSpec {
        ProviderSpec {
            id: self.id.clone(),
            display_name: self.name.clone().unwrap_or_else(|| self.id.clone()),
            category: self.category,
            per_call_timeout: self.timeout(),
            unit_cost: self.cost,
            priority: self.priority,
            available,
            credential: self.credential.clone(),
            notes: self.notes.clone(),
        }
    }
}

fn default_priority() -> u32 {
    99
}

fn default_true() -> bool {
    true
}

/// How a provider is implemented.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Remote API reached through a caller-supplied client
    Remote { client: String, model_id: String },
    /// Local model run on the inference pool
    LocalInference { model_id: String },
    /// Lanczos resize run on the transform pool
    Transform {
        scale: Option<u32>,
        #[serde(default = "default_true")]
        preserve_alpha: bool,
    },
}

/// Load a config from a YAML or TOML file, chosen by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        Some("toml") => Ok(toml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load a config and reject it if validation finds any problem.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
