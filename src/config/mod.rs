// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod credentials;
mod loader;
mod registry;
mod validation;

pub mod consts;

pub use credentials::Credentials;
pub use loader::{
    load_and_validate_config, load_config, BackendConfig, Config, ProviderConfig,
    ShotgunOptions, UpscaleOptions, WorkerOptions,
};
pub use registry::{ProviderEntry, ProviderRegistry};
pub use validation::validate_config;
