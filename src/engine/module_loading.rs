//! Module loading
//!
//! Turns the `load` commands of a script into MODULE and ALIAS bindings.
//! Every load in the script is resolved, wherever the cursor is, so the
//! load signature and the cached descriptors only change when the load
//! lines do. A pass then binds the loads above its cursor.
//!
//! Registry lookups for modules that are not already cached run
//! concurrently, each bounded by the external call timeout. Bindings are
//! produced in source order so the result does not depend on which lookup
//! finished first.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, warn};

use crate::ast::types::ScriptNode;
use crate::bindings::{Binding, ScopedBindings};
use crate::engine::errors::{ExternalCallError, ModuleLoadError};
use crate::engine::types::{LoadSignature, ModuleLoad, NodeFailure};
use crate::external::Collaborators;
use crate::modules::{ModuleDescriptor, ModuleRegistry, STD_MODULE};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub name: String,
    pub alias: Option<String>,
    pub line: Option<usize>,
}

impl LoadRequest {
    /// Key of the MODULE binding this load produces
    pub fn binding_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    fn label(&self) -> String {
        match &self.alias {
            Some(alias) => format!("load {} as {}", self.name, alias),
            None => format!("load {}", self.name),
        }
    }
}

/// All `load` commands (bare or `std:`-prefixed) in source order. Loads
/// without a module name yet are ignored.
pub fn collect_load_requests(script: &ScriptNode) -> Vec<LoadRequest> {
    script
        .flatten()
        .into_iter()
        .filter(|node| node.is_std_command("load"))
        .filter_map(|node| {
            let name = node.args.first()?.value().to_string();
            let alias = match (node.args.get(1), node.args.get(2)) {
                (Some(keyword), Some(alias)) if keyword.raw == "as" => Some(alias.value().to_string()),
                _ => None,
            };
            Some(LoadRequest {
                name,
                alias,
                line: node.start_line(),
            })
        })
        .collect()
}

pub fn load_signature(requests: &[LoadRequest]) -> LoadSignature {
    requests
        .iter()
        .map(|r| ModuleLoad {
            name: r.name.clone(),
            alias: r.alias.clone(),
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub request: LoadRequest,
    pub module: Arc<ModuleDescriptor>,
}

#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Successful loads in source order
    pub modules: Vec<LoadedModule>,
    pub failures: Vec<NodeFailure>,
    /// Registry lookups performed (cache misses)
    pub resolved: usize,
}

impl LoadOutcome {
    /// MODULE and ALIAS bindings of every successful load.
    pub fn bindings(&self) -> ScopedBindings {
        self.bindings_where(|_| true)
    }

    /// MODULE and ALIAS bindings of the loads starting strictly before
    /// `line`.
    pub fn bindings_before(&self, line: usize) -> ScopedBindings {
        self.bindings_where(|request| request.line.map_or(false, |l| l < line))
    }

    fn bindings_where(&self, keep: impl Fn(&LoadRequest) -> bool) -> ScopedBindings {
        let mut bindings = ScopedBindings::new();
        for loaded in self.modules.iter().filter(|l| keep(&l.request)) {
            let request = &loaded.request;
            bindings.bind(Binding::module(request.binding_key(), loaded.module.clone()));
            if let Some(alias) = &request.alias {
                bindings.bind(Binding::alias(alias.clone(), request.name.clone()));
            }
        }
        bindings
    }
}

pub struct ModuleLoader<'a> {
    registry: &'a dyn ModuleRegistry,
    collaborators: &'a Collaborators,
    timeout: Duration,
}

impl<'a> ModuleLoader<'a> {
    pub fn new(registry: &'a dyn ModuleRegistry, collaborators: &'a Collaborators, timeout: Duration) -> Self {
        Self {
            registry,
            collaborators,
            timeout,
        }
    }

    /// Load `requests`, taking descriptors from `cached` (keyed by module
    /// name) where present.
    pub async fn load(
        &self,
        requests: &[LoadRequest],
        cached: &IndexMap<String, Arc<ModuleDescriptor>>,
    ) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();

        // Duplicate checks first: they only depend on source order.
        let mut loaded: IndexSet<&str> = IndexSet::from([STD_MODULE]);
        let mut keys: IndexSet<&str> = IndexSet::from([STD_MODULE]);
        let mut accepted = Vec::new();
        for request in requests {
            let error = if loaded.contains(request.name.as_str()) {
                Some(ModuleLoadError::AlreadyLoaded {
                    name: request.name.clone(),
                })
            } else if keys.contains(request.binding_key()) {
                Some(ModuleLoadError::AliasInUse {
                    alias: request.binding_key().to_string(),
                })
            } else {
                None
            };

            match error {
                Some(error) => {
                    debug!(line = ?request.line, %error, "load rejected");
                    outcome.failures.push(NodeFailure::new(request.label(), request.line, error));
                }
                None => {
                    loaded.insert(request.name.as_str());
                    keys.insert(request.binding_key());
                    accepted.push(request);
                }
            }
        }

        let missing: Vec<&str> = accepted
            .iter()
            .map(|r| r.name.as_str())
            .filter(|name| !cached.contains_key(*name))
            .collect();
        outcome.resolved = missing.len();

        let lookups = missing.iter().map(|name| self.resolve(name));
        let resolved: IndexMap<&str, Result<Arc<ModuleDescriptor>, ModuleLoadError>> =
            missing.iter().copied().zip(join_all(lookups).await).collect();

        for request in accepted {
            let descriptor = match cached.get(&request.name) {
                Some(module) => Ok(module.clone()),
                None => match resolved.get(request.name.as_str()) {
                    Some(result) => result.clone(),
                    None => Err(ModuleLoadError::NotFound {
                        name: request.name.clone(),
                    }),
                },
            };

            match descriptor {
                Ok(module) => outcome.modules.push(LoadedModule {
                    request: request.clone(),
                    module,
                }),
                Err(error) => {
                    warn!(module = %request.name, %error, "module load failed");
                    outcome.failures.push(NodeFailure::new(request.label(), request.line, error));
                }
            }
        }

        outcome
    }

    async fn resolve(&self, name: &str) -> Result<Arc<ModuleDescriptor>, ModuleLoadError> {
        debug!(module = name, "resolving module");
        match tokio::time::timeout(self.timeout, self.registry.resolve(name, self.collaborators)).await {
            Ok(result) => result,
            Err(_) => Err(ExternalCallError::timeout(format!("loading module {}", name), self.timeout).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::BindingSpace;
    use crate::engine::errors::EngineError;
    use crate::external::{MemoryContentResolver, OfflineProvider};
    use crate::modules::StaticModuleRegistry;
    use crate::parser::parse;

    fn collaborators() -> Collaborators {
        Collaborators::new(
            Arc::new(OfflineProvider::new()),
            Arc::new(MemoryContentResolver::new()),
        )
    }

    #[test]
    fn test_collect_load_requests() {
        let script = parse("load aragonos as ar\nstd:load giveth\nset $x 1\nar:load nope").script;
        let requests = collect_load_requests(&script);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].alias.as_deref(), Some("ar"));
        assert_eq!(requests[0].binding_key(), "ar");
        assert_eq!(requests[1].name, "giveth");
        assert_eq!(requests[1].line, Some(1));

        assert_eq!(
            load_signature(&requests),
            vec![
                ModuleLoad { name: "aragonos".into(), alias: Some("ar".into()) },
                ModuleLoad { name: "giveth".into(), alias: None },
            ]
        );
    }

    #[test]
    fn test_incomplete_load_is_ignored() {
        let script = parse("load\nload aragonos as\n").script;
        let requests = collect_load_requests(&script);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].alias, None);
    }

    #[tokio::test]
    async fn test_load_binds_modules_and_aliases() {
        let registry = StaticModuleRegistry::with_builtin_modules();
        let collab = collaborators();
        let loader = ModuleLoader::new(&registry, &collab, Duration::from_secs(1));
        let script = parse("load aragonos as ar").script;

        let outcome = loader.load(&collect_load_requests(&script), &IndexMap::new()).await;
        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.resolved, 1);
        let bindings = outcome.bindings();
        assert!(bindings.module("ar").is_some());
        assert_eq!(bindings.alias_target("ar"), Some("aragonos"));
        assert!(bindings.lookup(BindingSpace::Module, "aragonos").is_none());
    }

    #[tokio::test]
    async fn test_load_errors_do_not_stop_other_loads() {
        let registry = StaticModuleRegistry::with_builtin_modules();
        let collab = collaborators();
        let loader = ModuleLoader::new(&registry, &collab, Duration::from_secs(1));
        let script = parse("load nonExistent\nload aragonos as ar\nload aragonos\nload std\n").script;

        let outcome = loader.load(&collect_load_requests(&script), &IndexMap::new()).await;
        let messages: Vec<String> = outcome.failures.iter().map(|f| f.error.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "Module aragonos already loaded",
                "Module std already loaded",
                "Module nonExistent not found",
            ]
        );
        assert!(outcome.bindings().module("ar").is_some());
    }

    #[tokio::test]
    async fn test_alias_in_use() {
        let registry = StaticModuleRegistry::with_builtin_modules();
        let collab = collaborators();
        let loader = ModuleLoader::new(&registry, &collab, Duration::from_secs(1));
        let requests = vec![
            LoadRequest { name: "aragonos".into(), alias: Some("x".into()), line: Some(0) },
            LoadRequest { name: "giveth".into(), alias: Some("x".into()), line: Some(1) },
        ];
        let outcome = loader.load(&requests, &IndexMap::new()).await;
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].error.to_string(), "Alias x already in use");
    }

    #[tokio::test]
    async fn test_cached_modules_skip_registry() {
        let registry = StaticModuleRegistry::new();
        let collab = collaborators();
        let loader = ModuleLoader::new(&registry, &collab, Duration::from_secs(1));
        let mut cached = IndexMap::new();
        cached.insert("aragonos".to_string(), Arc::new(crate::modules::aragonos_module()));

        let requests = vec![LoadRequest { name: "aragonos".into(), alias: None, line: Some(0) }];
        let outcome = loader.load(&requests, &cached).await;
        assert_eq!(outcome.resolved, 0);
        assert!(outcome.failures.is_empty());
        assert!(outcome.bindings().module("aragonos").is_some());
    }

    #[tokio::test]
    async fn test_bindings_before_line() {
        let mut registry = StaticModuleRegistry::with_builtin_modules();
        registry.register(ModuleDescriptor::new("tokens"));
        let collab = collaborators();
        let loader = ModuleLoader::new(&registry, &collab, Duration::from_secs(1));
        let script = parse("load aragonos as ar\nset $x 1\nload tokens\n").script;

        let outcome = loader.load(&collect_load_requests(&script), &IndexMap::new()).await;
        assert_eq!(outcome.resolved, 2);

        let above = outcome.bindings_before(1);
        assert!(above.module("ar").is_some());
        assert!(above.module("tokens").is_none());
        // the load on the cursor line itself is not bound yet
        assert!(outcome.bindings_before(2).module("tokens").is_none());
        assert!(outcome.bindings_before(3).module("tokens").is_some());
        assert!(outcome.bindings_before(0).visible(BindingSpace::Module).is_empty());
    }

    /// Registry that never answers for `stalled`
    struct StallingRegistry {
        inner: StaticModuleRegistry,
    }

    #[async_trait::async_trait]
    impl ModuleRegistry for StallingRegistry {
        fn available(&self) -> Vec<String> {
            self.inner.available()
        }

        async fn resolve(
            &self,
            name: &str,
            collaborators: &Collaborators,
        ) -> Result<Arc<ModuleDescriptor>, ModuleLoadError> {
            if name == "stalled" {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.inner.resolve(name, collaborators).await
        }
    }

    #[tokio::test]
    async fn test_slow_module_times_out_alone() {
        let mut inner = StaticModuleRegistry::with_builtin_modules();
        inner.register(ModuleDescriptor::new("stalled"));
        let registry = StallingRegistry { inner };
        let collab = collaborators();
        let loader = ModuleLoader::new(&registry, &collab, Duration::from_millis(20));
        let script = parse("load stalled\nload aragonos\n").script;

        let outcome = loader.load(&collect_load_requests(&script), &IndexMap::new()).await;
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].line, Some(0));
        assert!(matches!(
            outcome.failures[0].error,
            EngineError::ModuleLoad(ModuleLoadError::External(ExternalCallError::Timeout { .. }))
        ));
        let bindings = outcome.bindings();
        assert!(bindings.module("aragonos").is_some());
        assert!(bindings.module("stalled").is_none());
    }
}
