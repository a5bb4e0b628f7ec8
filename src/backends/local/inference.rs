// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::backends::local::{CpuPool, SessionCache};
use crate::errors::ProviderError;
use crate::traits::Provider;

/// Local background removal: a cached model session run on the inference pool.
pub struct LocalInferenceProvider {
    model_id: String,
    cache: Arc<SessionCache>,
    pool: CpuPool,
}

impl LocalInferenceProvider {
    pub fn new(model_id: impl Into<String>, cache: Arc<SessionCache>, pool: CpuPool) -> Self {
        Self {
            model_id: model_id.into(),
            cache,
            pool,
        }
    }
}

#[async_trait]
impl Provider for LocalInferenceProvider {
    async fn process(&self, payload: Arc<[u8]>, cancel: CancellationToken) -> Result<Vec<u8>, ProviderError> {
        let session = self.cache.get(&self.model_id, &cancel).await?;
        self.pool.run(&cancel, move || session.run(&payload)).await?
    }

    async fn is_available(&self) -> bool {
        self.cache.loader().has_model(&self.model_id)
    }

    fn name(&self) -> &'static str {
        "local_inference"
    }
}
