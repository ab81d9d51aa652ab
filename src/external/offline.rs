//! Offline collaborators
//!
//! Table-backed provider and content resolver. The CLI builds them from
//! its config file; tests use them as a baseline.

use async_trait::async_trait;
use indexmap::IndexMap;

use super::types::{ContentResolver, Provider};
use crate::engine::errors::ExternalCallError;

/// Provider answering name lookups from a fixed table.
#[derive(Debug, Clone, Default)]
pub struct OfflineProvider {
    names: IndexMap<String, String>,
}

impl OfflineProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_names<I, K, V>(names: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut provider = Self::new();
        for (name, address) in names {
            provider.insert(name, address);
        }
        provider
    }

    pub fn insert(&mut self, name: impl Into<String>, address: impl Into<String>) {
        self.names.insert(name.into(), address.into());
    }
}

#[async_trait]
impl Provider for OfflineProvider {
    async fn resolve_name(&self, name: &str) -> Result<Option<String>, ExternalCallError> {
        Ok(self.names.get(name).cloned())
    }
}

/// Content resolver serving documents from memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentResolver {
    documents: IndexMap<String, String>,
}

impl MemoryContentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            documents: documents
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[async_trait]
impl ContentResolver for MemoryContentResolver {
    async fn fetch(&self, address: &str) -> Result<String, ExternalCallError> {
        self.documents
            .get(address)
            .cloned()
            .ok_or_else(|| ExternalCallError::Content {
                message: format!("no content at {}", address),
            })
    }
}
