// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod provider;

pub use config::{ConfigError, ValidationError};
pub use execution::{DispatchError, SelectionError, SelectionRejection};
pub use provider::{PoolError, ProviderError, TransformError};
