// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation for provider definitions and shotgun policy.
//!
//! Validation accumulates every problem it finds so the user can fix a config
//! file in one pass instead of one error at a time. Checks run in this order:
//!
//! 1. **Uniqueness**: provider ids are unique
//! 2. **Provider sanity**: remote providers name a credential, timeouts are non-zero,
//!    transform scales are in range
//! 3. **References**: every default shotgun provider exists
//! 4. **Pools and upscale**: worker pools are non-empty, the default scale is in range
//!
//! # Example
//! ```rust
//! use masq::config::{validate_config, Config};
//!
//! let config = Config::default();
//! assert!(validate_config(&config).is_ok());
//! ```

use std::collections::HashSet;

use crate::config::consts::{MAX_SCALE, MIN_SCALE};
use crate::config::{BackendConfig, Config};
use crate::errors::ValidationError;

/// Validate a whole configuration, returning every problem found.
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    errors.extend(validate_unique_provider_ids(config));
    errors.extend(validate_provider_entries(config));
    errors.extend(validate_default_providers(config));
    errors.extend(validate_workers_and_upscale(config));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_provider_ids(config: &Config) -> Vec<ValidationError> {
    let mut seen_ids = HashSet::new();
    config
        .providers
        .iter()
        .filter(|provider| !seen_ids.insert(provider.id.as_str()))
        .map(|provider| ValidationError::DuplicateProviderId {
            provider_id: provider.id.clone(),
        })
        .collect()
}

fn validate_provider_entries(config: &Config) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for provider in &config.providers {
        if provider.category.requires_credential()
            && provider.credential.as_deref().map_or(true, str::is_empty)
        {
            errors.push(ValidationError::MissingCredentialName {
                provider_id: provider.id.clone(),
            });
        }

        if provider.timeout_secs == Some(0) {
            errors.push(ValidationError::ZeroTimeout {
                provider_id: provider.id.clone(),
            });
        }

        if let BackendConfig::Transform { scale: Some(scale), .. } = provider.backend {
            if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
                errors.push(ValidationError::ScaleOutOfRange {
                    scale,
                    min: MIN_SCALE,
                    max: MAX_SCALE,
                });
            }
        }
    }

    errors
}

fn validate_default_providers(config: &Config) -> Vec<ValidationError> {
    let known: HashSet<&str> = config.providers.iter().map(|p| p.id.as_str()).collect();
    config
        .shotgun
        .default_providers
        .iter()
        .filter(|id| !known.contains(id.as_str()))
        .map(|id| ValidationError::UnknownDefaultProvider {
            provider_id: id.clone(),
        })
        .collect()
}

fn validate_workers_and_upscale(config: &Config) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.workers.inference_workers() == 0 {
        errors.push(ValidationError::EmptyWorkerPool { pool: "inference" });
    }
    if config.workers.transform_workers() == 0 {
        errors.push(ValidationError::EmptyWorkerPool { pool: "transform" });
    }

    let scale = config.upscale.default_scale();
    if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
        errors.push(ValidationError::ScaleOutOfRange {
            scale,
            min: MIN_SCALE,
            max: MAX_SCALE,
        });
    }
    if config.upscale.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout {
            provider_id: crate::config::consts::TRANSFORM_PROVIDER_ID.to_string(),
        });
    }

    errors
}
