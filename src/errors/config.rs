// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Problems found while validating a provider configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Two providers share an id
    DuplicateProviderId { provider_id: String },
    /// The default shotgun set names a provider that is not configured
    UnknownDefaultProvider { provider_id: String },
    /// A remote provider does not say which credential it needs
    MissingCredentialName { provider_id: String },
    /// A provider timeout of zero would make every call time out immediately
    ZeroTimeout { provider_id: String },
    /// Upscale factor outside the supported range
    ScaleOutOfRange { scale: u32, min: u32, max: u32 },
    /// A worker pool with no workers can never run anything
    EmptyWorkerPool { pool: &'static str },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateProviderId { provider_id } => {
                write!(f, "Duplicate provider ID: '{}'", provider_id)
            }
            ValidationError::UnknownDefaultProvider { provider_id } => {
                write!(
                    f,
                    "Default provider '{}' is not defined in the providers list",
                    provider_id
                )
            }
            ValidationError::MissingCredentialName { provider_id } => {
                write!(
                    f,
                    "Remote provider '{}' must name the credential it requires",
                    provider_id
                )
            }
            ValidationError::ZeroTimeout { provider_id } => {
                write!(f, "Provider '{}' has a zero timeout", provider_id)
            }
            ValidationError::ScaleOutOfRange { scale, min, max } => {
                write!(
                    f,
                    "Upscale factor {} is outside the supported range {}..={}",
                    scale, min, max
                )
            }
            ValidationError::EmptyWorkerPool { pool } => {
                write!(f, "Worker pool '{}' must have at least one worker", pool)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported config file extension for {0} (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(PathBuf),

    #[error("configuration validation failed:\n{}", format_validation_errors(.0))]
    Invalid(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
