// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Bounded pool for CPU-bound work.
//!
//! Work runs on tokio's blocking threads so the async workers stay free, but
//! at most `size` jobs run at once; the rest wait for a permit. Waiting is
//! cancellable. Work that is already running cannot be interrupted, so on
//! cancellation the caller gets [`PoolError::Cancelled`] immediately and the
//! late result is discarded when the blocking job finishes. The permit is
//! released only then, which keeps the concurrency bound honest.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::errors::PoolError;
use crate::utils::join_error_message;

#[derive(Debug, Clone)]
pub struct CpuPool {
    name: &'static str,
    size: usize,
    permits: Arc<Semaphore>,
}

impl CpuPool {
    /// A pool of `size` workers. Zero is raised to one.
    pub fn new(name: &'static str, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name,
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Workers not currently busy.
    pub fn idle(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stop accepting work. Jobs already running finish normally.
    pub fn close(&self) {
        self.permits.close();
    }

    pub async fn run<F, T>(&self, cancel: &CancellationToken, work: F) -> Result<T, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PoolError::Cancelled),
            permit = Arc::clone(&self.permits).acquire_owned() => {
                permit.map_err(|_| PoolError::Closed)?
            }
        };

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PoolError::Cancelled),
            joined = handle => joined.map_err(|e| PoolError::Panicked(join_error_message(e))),
        }
    }
}
