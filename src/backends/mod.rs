// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Provider backend implementations.
//!
//! Every backend implements the [`Provider`](crate::traits::Provider) trait
//! and is instantiated from configuration through [`ProviderFactory`].
//!
//! # Available Backends
//!
//! ## Remote Backend
//! Background removal through a remote API client supplied by the caller:
//! - **Single call**: [`remote::RemoteBackend`] returns the processed image directly
//! - **Task queue**: [`remote::PollingBackend`] drives a submit / poll / fetch [`remote::TaskApi`]
//! - **Cost**: billed per image, reported on each successful outcome
//!
//! ## Local Backend
//! In-process CPU work on bounded pools:
//! - **Inference**: cached model sessions behind [`local::ModelLoader`]
//! - **Transform**: Lanczos upscaling with alpha handling
//! - **Cost**: free
//!
//! ## Stub Backend (Test-Only)
//! Scripted providers (delayed, failing, hanging, panicking, blocking) used by
//! the engine tests. Not available in production builds.
//!
//! # Architecture
//!
//! ```text
//! Configuration + Backends → ProviderFactory → ProviderRegistry → Dispatcher
//! ```

pub mod factory;
pub mod local;
pub mod remote;
#[cfg(test)]
pub mod stub;

pub use factory::{Backends, ProviderFactory};
