// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::fmt;

use crate::config::Config;

/// Named secrets (API keys) available to the registry.
///
/// Only presence matters to the core: a remote provider whose credential is
/// missing or empty is registered as unavailable and never dispatched. The
/// values themselves are handed to whichever collaborator talks to the wire.
#[derive(Clone, Default)]
pub struct Credentials(HashMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Read every credential the config refers to from the environment.
    pub fn from_env(config: &Config) -> Self {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    /// Same as [`Credentials::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(config: &Config, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut credentials = Self::new();
        for name in config.providers.iter().filter_map(|p| p.credential.as_deref()) {
            if let Some(value) = lookup(name) {
                credentials.insert(name, value);
            }
        }
        credentials
    }

    /// Empty values are treated as absent.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        if !value.trim().is_empty() {
            self.0.insert(name.into(), value);
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }
}

// Secrets never reach logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.0.keys().collect();
        names.sort();
        f.debug_struct("Credentials").field("names", &names).finish()
    }
}
