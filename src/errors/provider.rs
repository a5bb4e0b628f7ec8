// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised inside a single unit of provider work.
//!
//! None of these ever escape the dispatcher: each one is converted into a
//! [`TaskOutcome`](crate::engine::TaskOutcome) status at the unit boundary.

use std::time::Duration;
use thiserror::Error;

/// Failure of one provider call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The backend rejected or failed the request. Message kept for diagnostics.
    #[error("{0}")]
    Failed(String),

    /// The provider gave up on its own deadline (e.g. a poll loop ran out).
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The provider cannot serve requests right now (missing key, model absent).
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The surrounding batch was cancelled while this call was in flight.
    #[error("cancelled")]
    Cancelled,
}

impl ProviderError {
    pub fn failed(message: impl Into<String>) -> Self {
        ProviderError::Failed(message.into())
    }
}

impl From<PoolError> for ProviderError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::Cancelled => ProviderError::Cancelled,
            other => ProviderError::Failed(other.to_string()),
        }
    }
}

impl From<TransformError> for ProviderError {
    fn from(err: TransformError) -> Self {
        ProviderError::Failed(err.to_string())
    }
}

/// Errors from the bounded CPU worker pool.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    #[error("cancelled while queued or running on the worker pool")]
    Cancelled,

    #[error("worker pool is closed")]
    Closed,

    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Errors from the image transform engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The payload could not be decoded as an image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The resized image could not be encoded back to PNG.
    #[error("failed to encode image: {0}")]
    Encode(String),
}
