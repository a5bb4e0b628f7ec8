// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::traits::Provider;

/// Client for a remote background-removal API.
///
/// Implementations own authentication, uploads and transport. Returning
/// `ProviderError::Unavailable` marks the outcome as such (quota, auth).
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    async fn remove_background(&self, model_id: &str, image: Arc<[u8]>) -> Result<Vec<u8>, ProviderError>;

    async fn health(&self) -> bool {
        true
    }
}

/// A [`RemoteBackend`] bound to one model.
pub struct RemoteProvider {
    model_id: String,
    backend: Arc<dyn RemoteBackend>,
}

impl RemoteProvider {
    pub fn new(model_id: impl Into<String>, backend: Arc<dyn RemoteBackend>) -> Self {
        Self {
            model_id: model_id.into(),
            backend,
        }
    }
}

#[async_trait]
impl Provider for RemoteProvider {
    async fn process(&self, payload: Arc<[u8]>, cancel: CancellationToken) -> Result<Vec<u8>, ProviderError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::Cancelled),
            result = self.backend.remove_background(&self.model_id, payload) => result,
        }
    }

    async fn is_available(&self) -> bool {
        self.backend.health().await
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
