// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use crate::backends::local::{
    CpuPool, LocalInferenceProvider, ModelLoader, SessionCache, TransformProvider,
};
use crate::backends::remote::{RemoteBackend, RemoteProvider};
use crate::config::{BackendConfig, Config, Credentials, ProviderConfig, ProviderEntry, ProviderRegistry};
use crate::observability::messages::registry::ProviderSkipped;
use crate::observability::messages::StructuredLog;
use crate::traits::Provider;

/// Collaborators the factory wires providers to.
#[derive(Default, Clone)]
pub struct Backends {
    /// Remote API clients by the name used in `backend.client`
    pub remote: HashMap<String, Arc<dyn RemoteBackend>>,
    pub model_loader: Option<Arc<dyn ModelLoader>>,
}

impl Backends {
    pub fn with_remote(mut self, client: impl Into<String>, backend: Arc<dyn RemoteBackend>) -> Self {
        self.remote.insert(client.into(), backend);
        self
    }

    pub fn with_model_loader(mut self, loader: Arc<dyn ModelLoader>) -> Self {
        self.model_loader = Some(loader);
        self
    }
}

/// Factory for creating provider instances from configuration.
///
/// Owns the two CPU pools and the session cache so every provider it builds
/// shares them.
pub struct ProviderFactory {
    backends: Backends,
    inference_pool: CpuPool,
    transform_pool: CpuPool,
    sessions: Option<Arc<SessionCache>>,
    default_scale: u32,
}

impl ProviderFactory {
    pub fn new(config: &Config, backends: Backends) -> Self {
        let inference_pool = CpuPool::new("inference", config.workers.inference_workers());
        let transform_pool = CpuPool::new("transform", config.workers.transform_workers());
        let sessions = backends
            .model_loader
            .as_ref()
            .map(|loader| Arc::new(SessionCache::new(Arc::clone(loader), inference_pool.clone())));

        Self {
            backends,
            inference_pool,
            transform_pool,
            sessions,
            default_scale: config.upscale.default_scale(),
        }
    }

    pub fn transform_pool(&self) -> &CpuPool {
        &self.transform_pool
    }

    pub fn inference_pool(&self) -> &CpuPool {
        &self.inference_pool
    }

    /// Create a provider instance from one config entry.
    ///
    /// The backend type decides the implementation:
    /// - `remote` -> [`RemoteProvider`] over the named client in [`Backends::remote`]
    /// - `local_inference` -> [`LocalInferenceProvider`] over the shared session cache
    /// - `transform` -> [`TransformProvider`] on the transform pool
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Arc<dyn Provider>, String> {
        match &config.backend {
            BackendConfig::Remote { client, model_id } => {
                let backend = self
                    .backends
                    .remote
                    .get(client)
                    .ok_or_else(|| format!("no remote client named '{}' was supplied", client))?;
                Ok(Arc::new(RemoteProvider::new(model_id.clone(), Arc::clone(backend))))
            }
            BackendConfig::LocalInference { model_id } => {
                let sessions = self
                    .sessions
                    .as_ref()
                    .ok_or_else(|| "no model loader was supplied".to_string())?;
                Ok(Arc::new(LocalInferenceProvider::new(
                    model_id.clone(),
                    Arc::clone(sessions),
                    self.inference_pool.clone(),
                )))
            }
            BackendConfig::Transform {
                scale,
                preserve_alpha,
            } => Ok(Arc::new(TransformProvider::new(
                scale.unwrap_or(self.default_scale),
                *preserve_alpha,
                self.transform_pool.clone(),
            ))),
        }
    }

    /// Registry entries for every provider that could be built. The rest are
    /// logged and left out.
    pub fn build_entries(&self, config: &Config) -> Vec<ProviderEntry> {
        config
            .providers
            .iter()
            .filter_map(|provider_config| match self.create_provider(provider_config) {
                Ok(provider) => Some(ProviderEntry {
                    spec: provider_config.to_spec(false),
                    enabled: provider_config.enabled,
                    provider,
                }),
                Err(reason) => {
                    ProviderSkipped {
                        provider_id: &provider_config.id,
                        reason: &reason,
                    }
                    .log();
                    None
                }
            })
            .collect()
    }

    pub fn build_registry(&self, config: &Config, credentials: &Credentials) -> ProviderRegistry {
        ProviderRegistry::build(
            self.build_entries(config),
            config.shotgun.default_providers.clone(),
            credentials,
        )
    }
}
