// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scripted providers for tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::backends::local::CpuPool;
use crate::errors::ProviderError;
use crate::traits::{Provider, ProviderSpec, ResolvedProvider};

/// Sleeps for `delay` (honouring cancellation), then returns its output or
/// echoes the payload.
pub struct DelayedProvider {
    delay: Duration,
    output: Option<Vec<u8>>,
    healthy: bool,
    calls: AtomicUsize,
}

impl DelayedProvider {
    pub fn echo(delay: Duration) -> Self {
        Self {
            delay,
            output: None,
            healthy: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(delay: Duration, output: impl Into<Vec<u8>>) -> Self {
        Self {
            output: Some(output.into()),
            ..Self::echo(delay)
        }
    }

    pub fn with_probe(mut self, healthy: bool) -> Self {
        self.healthy = healthy;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for DelayedProvider {
    async fn process(&self, payload: Arc<[u8]>, cancel: CancellationToken) -> Result<Vec<u8>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            _ = tokio::time::sleep(self.delay) => {
                Ok(self.output.clone().unwrap_or_else(|| payload.to_vec()))
            }
        }
    }

    async fn is_available(&self) -> bool {
        self.healthy
    }

    fn name(&self) -> &'static str {
        "delayed"
    }
}

/// Fails after an optional delay.
pub struct FailingProvider {
    delay: Duration,
    error: ProviderError,
}

impl FailingProvider {
    pub fn new(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            error: ProviderError::failed(message),
        }
    }

    pub fn with_error(delay: Duration, error: ProviderError) -> Self {
        Self { delay, error }
    }
}

#[async_trait]
impl Provider for FailingProvider {
    async fn process(&self, _payload: Arc<[u8]>, _cancel: CancellationToken) -> Result<Vec<u8>, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Err(self.error.clone())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

/// Never completes and ignores its cancellation token.
pub struct HangingProvider;

#[async_trait]
impl Provider for HangingProvider {
    async fn process(&self, _payload: Arc<[u8]>, _cancel: CancellationToken) -> Result<Vec<u8>, ProviderError> {
        std::future::pending().await
    }

    fn name(&self) -> &'static str {
        "hanging"
    }
}

/// Panics in every method.
pub struct PanickingProvider;

#[async_trait]
impl Provider for PanickingProvider {
    async fn process(&self, _payload: Arc<[u8]>, _cancel: CancellationToken) -> Result<Vec<u8>, ProviderError> {
        panic!("provider bug")
    }

    async fn is_available(&self) -> bool {
        panic!("probe bug")
    }

    fn name(&self) -> &'static str {
        "panicking"
    }
}

/// Blocks a pool thread with a real sleep; cannot be interrupted once started.
pub struct BlockingProvider {
    pub pool: CpuPool,
    pub duration: Duration,
}

#[async_trait]
impl Provider for BlockingProvider {
    async fn process(&self, payload: Arc<[u8]>, cancel: CancellationToken) -> Result<Vec<u8>, ProviderError> {
        let duration = self.duration;
        let output = self
            .pool
            .run(&cancel, move || {
                std::thread::sleep(duration);
                payload.to_vec()
            })
            .await?;
        Ok(output)
    }

    fn name(&self) -> &'static str {
        "blocking"
    }
}

/// Pairs a provider with a free local spec.
pub fn resolved(id: &str, timeout: Duration, provider: impl Provider + 'static) -> ResolvedProvider {
    ResolvedProvider::new(ProviderSpec::local(id, timeout), Arc::new(provider))
}

/// Same as [`resolved`] with a unit cost and priority.
pub fn priced(
    id: &str,
    timeout: Duration,
    unit_cost: f64,
    priority: u32,
    provider: impl Provider + 'static,
) -> ResolvedProvider {
    let spec = ProviderSpec {
        unit_cost,
        priority,
        ..ProviderSpec::local(id, timeout)
    };
    ResolvedProvider::new(spec, Arc::new(provider))
}
