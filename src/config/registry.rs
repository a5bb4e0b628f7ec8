// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Provider registry: maps provider ids to instances and decides which of them
//! a job may dispatch to.
//!
//! Availability is computed once when the registry is built. A provider is
//! available when it is enabled and, for remote categories, its credential is
//! present. Resolution never fails: unknown, unavailable and repeated ids are
//! logged and dropped, so an unlucky request simply resolves to fewer (or
//! zero) providers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::config::Credentials;
use crate::observability::messages::registry::{
    DuplicateProvider, ProviderNotFound, ProviderRegistered, ProviderUnavailable,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{Provider, ProviderSpec, ResolvedProvider};

/// A provider as handed to [`ProviderRegistry::build`], before availability
/// has been decided.
pub struct ProviderEntry {
    pub spec: ProviderSpec,
    pub enabled: bool,
    pub provider: Arc<dyn Provider>,
}

impl ProviderEntry {
    pub fn new(spec: ProviderSpec, provider: Arc<dyn Provider>) -> Self {
        Self {
            spec,
            enabled: true,
            provider,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Registered providers plus the default shotgun set.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, ResolvedProvider>,
    /// Registration order; ties in priority fall back to it
    order: Vec<String>,
    unavailable_reasons: HashMap<String, String>,
    defaults: Vec<String>,
}

impl ProviderRegistry {
    /// Build the registry, fixing each provider's availability.
    pub fn build<I>(entries: I, default_providers: Vec<String>, credentials: &Credentials) -> Self
    where
        I: IntoIterator<Item = ProviderEntry>,
    {
        let mut registry = Self {
            defaults: default_providers,
            ..Self::default()
        };

        for ProviderEntry {
            mut spec,
            enabled,
            provider,
        } in entries
        {
            if registry.providers.contains_key(&spec.id) {
                DuplicateProvider {
                    provider_id: &spec.id,
                    context: "the registry",
                }
                .log();
                continue;
            }

            let reason = unavailable_reason(&spec, enabled, credentials);
            spec.available = reason.is_none();

            ProviderRegistered {
                provider_id: &spec.id,
                category: spec.category.as_str(),
                available: spec.available,
            }
            .log();

            if let Some(reason) = reason {
                registry.unavailable_reasons.insert(spec.id.clone(), reason);
            }
            registry.order.push(spec.id.clone());
            registry
                .providers
                .insert(spec.id.clone(), ResolvedProvider::new(spec, provider));
        }

        registry
    }

    /// Turn a request into the ordered list of providers to dispatch.
    ///
    /// An empty request uses the default set; an empty default set means every
    /// available provider, by priority. Explicit ids keep request order.
    pub fn resolve(&self, requested: &[String]) -> Vec<ResolvedProvider> {
        if !requested.is_empty() {
            return self.pick(requested, "the request");
        }
        if !self.defaults.is_empty() {
            return self.pick(&self.defaults, "the default provider set");
        }
        self.catalog_entries()
            .into_iter()
            .filter(|p| p.spec.available)
            .cloned()
            .collect()
    }

    fn pick(&self, ids: &[String], context: &str) -> Vec<ResolvedProvider> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(ids.len());

        for id in ids {
            if !seen.insert(id.as_str()) {
                DuplicateProvider {
                    provider_id: id,
                    context,
                }
                .log();
                continue;
            }

            let Some(provider) = self.providers.get(id) else {
                ProviderNotFound { provider_id: id }.log();
                continue;
            };

            if !provider.spec.available {
                let reason = self
                    .unavailable_reasons
                    .get(id)
                    .map(String::as_str)
                    .unwrap_or("unavailable");
                ProviderUnavailable {
                    provider_id: id,
                    reason,
                }
                .log();
                continue;
            }

            resolved.push(provider.clone());
        }

        resolved
    }

    fn catalog_entries(&self) -> Vec<&ResolvedProvider> {
        let mut entries: Vec<&ResolvedProvider> = self
            .order
            .iter()
            .filter_map(|id| self.providers.get(id))
            .collect();
        entries.sort_by_key(|p| p.spec.priority);
        entries
    }

    /// Every registered spec, available or not, sorted by priority.
    pub fn catalog(&self) -> Vec<Arc<ProviderSpec>> {
        self.catalog_entries()
            .into_iter()
            .map(|p| Arc::clone(&p.spec))
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&ResolvedProvider> {
        self.providers.get(id)
    }

    /// Priority of every registered provider, for ranking results.
    pub fn priorities(&self) -> HashMap<String, u32> {
        self.providers
            .iter()
            .map(|(id, p)| (id.clone(), p.spec.priority))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run every available provider's liveness probe concurrently.
    ///
    /// Returns `(id, healthy)` in catalog order. Unavailable providers are not
    /// probed and report `false`; a probe that panics counts as unhealthy.
    pub async fn probe(&self) -> Vec<(String, bool)> {
        let catalog = self.catalog_entries();
        let mut health = vec![false; catalog.len()];
        let mut probes = JoinSet::new();

        for (index, entry) in catalog.iter().enumerate() {
            if !entry.spec.available {
                continue;
            }
            let provider = Arc::clone(&entry.provider);
            probes.spawn(async move { (index, provider.is_available().await) });
        }

        while let Some(joined) = probes.join_next().await {
            if let Ok((index, healthy)) = joined {
                health[index] = healthy;
            }
        }

        catalog
            .into_iter()
            .zip(health)
            .map(|(entry, healthy)| (entry.spec.id.clone(), healthy))
            .collect()
    }
}

fn unavailable_reason(spec: &ProviderSpec, enabled: bool, credentials: &Credentials) -> Option<String> {
    if !enabled {
        return Some("disabled in configuration".to_string());
    }
    if !spec.category.requires_credential() {
        return None;
    }
    match spec.credential.as_deref() {
        None => Some("no credential configured".to_string()),
        Some(name) if !credentials.contains(name) => Some(format!("credential {} is not set", name)),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{DelayedProvider, PanickingProvider};
    use crate::traits::ProviderCategory;
    use std::time::Duration;

    fn spec(id: &str, category: ProviderCategory, priority: u32) -> ProviderSpec {
        ProviderSpec {
            id: id.to_string(),
            display_name: id.to_uppercase(),
            category,
            per_call_timeout: Duration::from_secs(120),
            unit_cost: 0.0,
            priority,
            available: false,
            credential: category
                .requires_credential()
                .then(|| format!("{}_KEY", id.to_uppercase())),
            notes: None,
        }
    }

    fn entry(id: &str, category: ProviderCategory, priority: u32) -> ProviderEntry {
        ProviderEntry::new(
            spec(id, category, priority),
            Arc::new(DelayedProvider::echo(Duration::ZERO)),
        )
    }

    fn ids(resolved: &[ResolvedProvider]) -> Vec<&str> {
        resolved.iter().map(ResolvedProvider::id).collect()
    }

    fn sample_registry(defaults: Vec<String>) -> ProviderRegistry {
        let credentials = Credentials::new().with("PAID_KEY", "k");
        ProviderRegistry::build(
            vec![
                entry("paid", ProviderCategory::RemotePaid, 2),
                entry("metered", ProviderCategory::RemoteMetered, 1),
                entry("local", ProviderCategory::LocalFree, 3),
                entry("off", ProviderCategory::LocalFree, 0).disabled(),
                entry("also_local", ProviderCategory::LocalFree, 3),
            ],
            defaults,
            &credentials,
        )
    }

    #[test]
    fn test_availability_is_derived_at_build() {
        let registry = sample_registry(vec![]);
        let available: HashMap<String, bool> = registry
            .catalog()
            .iter()
            .map(|s| (s.id.clone(), s.available))
            .collect();

        assert!(available["paid"]);
        assert!(!available["metered"], "credential missing");
        assert!(available["local"]);
        assert!(!available["off"], "disabled");
    }

    #[test]
    fn test_resolve_table_driven() {
        struct TestCase {
            name: &'static str,
            defaults: Vec<&'static str>,
            requested: Vec<&'static str>,
            expected: Vec<&'static str>,
        }

        let test_cases = vec![
            TestCase {
                name: "explicit request keeps request order",
                defaults: vec![],
                requested: vec!["local", "paid"],
                expected: vec!["local", "paid"],
            },
            TestCase {
                name: "unknown ids are dropped",
                defaults: vec![],
                requested: vec!["ghost", "local"],
                expected: vec!["local"],
            },
            TestCase {
                name: "unavailable ids are dropped",
                defaults: vec![],
                requested: vec!["metered", "off", "paid"],
                expected: vec!["paid"],
            },
            TestCase {
                name: "repeated ids are dispatched once",
                defaults: vec![],
                requested: vec!["local", "paid", "local"],
                expected: vec!["local", "paid"],
            },
            TestCase {
                name: "empty request uses defaults",
                defaults: vec!["also_local", "metered", "paid"],
                requested: vec![],
                expected: vec!["also_local", "paid"],
            },
            TestCase {
                name: "empty defaults mean every available provider by priority",
                defaults: vec![],
                requested: vec![],
                expected: vec!["paid", "local", "also_local"],
            },
            TestCase {
                name: "nothing resolvable",
                defaults: vec![],
                requested: vec!["ghost", "metered"],
                expected: vec![],
            },
        ];

        for test_case in test_cases {
            let registry =
                sample_registry(test_case.defaults.iter().map(|s| s.to_string()).collect());
            let requested: Vec<String> = test_case.requested.iter().map(|s| s.to_string()).collect();
            let resolved = registry.resolve(&requested);
            assert_eq!(ids(&resolved), test_case.expected, "{}", test_case.name);
        }
    }

    #[test]
    fn test_catalog_includes_unavailable_sorted_by_priority() {
        let registry = sample_registry(vec![]);
        let order: Vec<String> = registry.catalog().iter().map(|s| s.id.clone()).collect();
        assert_eq!(order, vec!["off", "metered", "paid", "local", "also_local"]);
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_duplicate_entries_keep_first() {
        let registry = ProviderRegistry::build(
            vec![
                entry("dup", ProviderCategory::LocalFree, 1),
                entry("dup", ProviderCategory::LocalFree, 7),
            ],
            vec![],
            &Credentials::new(),
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.priorities()["dup"], 1);
    }

    #[tokio::test]
    async fn test_probe_reports_health_in_catalog_order() {
        let registry = ProviderRegistry::build(
            vec![
                entry("healthy", ProviderCategory::LocalFree, 1),
                ProviderEntry::new(
                    spec("sick", ProviderCategory::LocalFree, 2),
                    Arc::new(DelayedProvider::echo(Duration::ZERO).with_probe(false)),
                ),
                ProviderEntry::new(
                    spec("boom", ProviderCategory::LocalFree, 3),
                    Arc::new(PanickingProvider),
                ),
                entry("locked", ProviderCategory::RemotePaid, 4),
            ],
            vec![],
            &Credentials::new(),
        );

        let health = registry.probe().await;
        assert_eq!(
            health,
            vec![
                ("healthy".to_string(), true),
                ("sick".to_string(), false),
                ("boom".to_string(), false),
                ("locked".to_string(), false),
            ]
        );
    }
}
