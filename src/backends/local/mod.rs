// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Providers that run on this machine.
//!
//! Both kinds are CPU-bound and run on a bounded [`CpuPool`]: model inference
//! on the inference pool, Lanczos upscaling on the transform pool.

pub mod inference;
pub mod pool;
pub mod session_cache;
pub mod transform;

pub use inference::LocalInferenceProvider;
pub use pool::CpuPool;
pub use session_cache::{InferenceSession, ModelLoader, SessionCache};
pub use transform::{transform, TransformOutput, TransformProvider};
