//! Module registry
//!
//! Maps module names to descriptors. Builtin modules are held in memory;
//! remote modules are TOML manifests fetched through the content resolver
//! each time they are resolved.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::debug;

use super::aragonos::aragonos_module;
use super::types::{CommandDescriptor, HelperDescriptor, ModuleDescriptor};
use crate::engine::errors::{ExternalCallError, ModuleLoadError};
use crate::external::Collaborators;

/// Source of module descriptors for `load` commands.
#[async_trait]
pub trait ModuleRegistry: Send + Sync {
    /// Names that can be loaded, in registration order.
    fn available(&self) -> Vec<String>;

    async fn resolve(
        &self,
        name: &str,
        collaborators: &Collaborators,
    ) -> Result<Arc<ModuleDescriptor>, ModuleLoadError>;
}

#[derive(Debug, Clone)]
pub enum ModuleSource {
    Builtin(Arc<ModuleDescriptor>),
    /// Manifest fetched through the content resolver on every resolve
    Remote { content_address: String },
}

/// Shape of a remote module manifest (TOML).
#[derive(Debug, Deserialize)]
struct RemoteManifest {
    #[serde(default)]
    commands: Vec<RemoteEntry>,
    #[serde(default)]
    helpers: Vec<RemoteEntry>,
}

#[derive(Debug, Deserialize)]
struct RemoteEntry {
    name: String,
    #[serde(default)]
    description: String,
}

pub struct StaticModuleRegistry {
    modules: IndexMap<String, ModuleSource>,
}

impl StaticModuleRegistry {
    pub fn new() -> Self {
        Self {
            modules: IndexMap::new(),
        }
    }

    /// Registry holding the modules that ship with the engine.
    pub fn with_builtin_modules() -> Self {
        let mut registry = Self::new();
        registry.register(aragonos_module());
        registry
    }

    pub fn register(&mut self, module: ModuleDescriptor) {
        self.modules
            .insert(module.name.clone(), ModuleSource::Builtin(Arc::new(module)));
    }

    pub fn register_remote(&mut self, name: impl Into<String>, content_address: impl Into<String>) {
        self.modules.insert(
            name.into(),
            ModuleSource::Remote {
                content_address: content_address.into(),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }
}

impl Default for StaticModuleRegistry {
    fn default() -> Self {
        Self::with_builtin_modules()
    }
}

#[async_trait]
impl ModuleRegistry for StaticModuleRegistry {
    fn available(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    async fn resolve(
        &self,
        name: &str,
        collaborators: &Collaborators,
    ) -> Result<Arc<ModuleDescriptor>, ModuleLoadError> {
        match self.modules.get(name) {
            None => Err(ModuleLoadError::NotFound {
                name: name.to_string(),
            }),
            Some(ModuleSource::Builtin(module)) => Ok(module.clone()),
            Some(ModuleSource::Remote { content_address }) => {
                debug!(module = name, address = %content_address, "fetching remote module");
                let content = collaborators.resolver.fetch(content_address).await?;
                if content.trim().is_empty() {
                    return Err(ExternalCallError::Content {
                        message: format!("empty content at {}", content_address),
                    }
                    .into());
                }
                parse_manifest(name, &content).map(Arc::new)
            }
        }
    }
}

/// Build a descriptor from a remote manifest. Remote commands carry no
/// eager evaluator and no argument completions.
fn parse_manifest(name: &str, content: &str) -> Result<ModuleDescriptor, ModuleLoadError> {
    let manifest: RemoteManifest =
        toml::from_str(content).map_err(|e| ModuleLoadError::InvalidContent {
            name: name.to_string(),
            message: e.to_string(),
        })?;

    let mut module = ModuleDescriptor::new(name);
    for entry in manifest.commands {
        module = module.with_command(CommandDescriptor::new(entry.name, entry.description));
    }
    for entry in manifest.helpers {
        module = module.with_helper(HelperDescriptor::new(entry.name, entry.description));
    }
    Ok(module)
}
