// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;       // provider backends (remote, local, stubs)
pub mod config;         // config, credentials + registry
pub mod engine;         // dispatcher, pipeline, selector
pub mod errors;         // error handling
pub mod observability;
pub mod traits;         // provider abstraction
pub mod utils;
