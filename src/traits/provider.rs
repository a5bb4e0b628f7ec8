// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;

/// Billing/locality class of a provider.
///
/// The provider set is closed: every backend is either a paid remote API, a
/// metered remote API, or something that runs on this machine for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    RemotePaid,
    RemoteMetered,
    LocalFree,
}

impl ProviderCategory {
    /// Remote categories cannot be dispatched without a credential.
    pub fn requires_credential(&self) -> bool {
        !matches!(self, ProviderCategory::LocalFree)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderCategory::RemotePaid => "remote_paid",
            ProviderCategory::RemoteMetered => "remote_metered",
            ProviderCategory::LocalFree => "local_free",
        }
    }
}

/// Static description of a provider as seen by the dispatcher and selector.
///
/// Built once when the registry is assembled; `available` is derived at that
/// point from the enabled flag and credential presence and never changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSpec {
    pub id: String,
    pub display_name: String,
    pub category: ProviderCategory,
    #[serde(rename = "per_call_timeout_ms", with = "crate::utils::serialization::duration_ms")]
    pub per_call_timeout: Duration,
    pub unit_cost: f64,
    pub priority: u32,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ProviderSpec {
    /// A spec that is available, free and local. Handy for synthetic providers.
    pub fn local(id: impl Into<String>, per_call_timeout: Duration) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            category: ProviderCategory::LocalFree,
            per_call_timeout,
            unit_cost: 0.0,
            priority: u32::MAX,
            available: true,
            credential: None,
            notes: None,
        }
    }
}

/// Processed bytes plus whatever the provider can say about them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderOutput {
    pub bytes: Vec<u8>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ProviderOutput {
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

impl From<Vec<u8>> for ProviderOutput {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            metadata: BTreeMap::new(),
        }
    }
}

/// A backend capable of processing one unit of work.
///
/// Implementations receive the job payload and a cancellation token. Every
/// suspension point inside `process` should observe the token; the dispatcher
/// also drops the future when the batch deadline passes, so a provider that
/// ignores the token is still cut off, it just learns about it later.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn process(
        &self,
        payload: Arc<[u8]>,
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, ProviderError>;

    /// `process` plus metadata. The dispatcher calls this one; providers
    /// with nothing to report keep the default.
    async fn process_detailed(
        &self,
        payload: Arc<[u8]>,
        cancel: CancellationToken,
    ) -> Result<ProviderOutput, ProviderError> {
        self.process(payload, cancel).await.map(ProviderOutput::from)
    }

    /// Liveness probe. Credential presence is checked by the registry, so the
    /// default only says "nothing else to check".
    async fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str;
}

/// A provider paired with its spec, as handed to the dispatcher.
#[derive(Clone)]
pub struct ResolvedProvider {
    pub spec: Arc<ProviderSpec>,
    pub provider: Arc<dyn Provider>,
}

impl ResolvedProvider {
    pub fn new(spec: ProviderSpec, provider: Arc<dyn Provider>) -> Self {
        Self {
            spec: Arc::new(spec),
            provider,
        }
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }
}

impl std::fmt::Debug for ResolvedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProvider")
            .field("id", &self.spec.id)
            .field("implementation", &self.provider.name())
            .field("category", &self.spec.category)
            .finish()
    }
}
