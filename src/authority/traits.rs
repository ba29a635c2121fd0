//! Trait abstraction for the Resource Authority

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Request-scoped visibility filters forwarded to the authority
/// (e.g. `published=true`, `env=production`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityScope(BTreeMap<String, String>);

impl AuthorityScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Scope from optional `published` / `env` request parameters
    pub fn from_request(published: Option<&str>, env: Option<&str>) -> Self {
        let mut scope = Self::new();
        if let Some(p) = published.filter(|p| !p.is_empty()) {
            scope = scope.with("published", p);
        }
        if let Some(e) = env.filter(|e| !e.is_empty()) {
            scope = scope.with("env", e);
        }
        scope
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Query-string pairs in key order
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// The authority's single operation: which of these ids currently exist and
/// are visible under `scope`.
#[async_trait]
pub trait ResourceAuthority: Send + Sync {
    /// Returns the subset of `ids` confirmed by the authority, in any order
    async fn filter_ids(&self, ids: &[String], scope: &AuthorityScope) -> Result<Vec<String>>;
}
