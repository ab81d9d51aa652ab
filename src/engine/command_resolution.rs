//! Command Resolution
//!
//! Maps a command node, possibly alias-qualified, to the module and
//! command descriptor it targets.
//!
//! Prefixed nodes resolve the prefix through ALIAS bindings first, then
//! directly through MODULE bindings. Unprefixed nodes try, in order: the
//! module of the innermost enclosing block, `std`, then every loaded
//! module that was not given an alias.

use std::sync::Arc;

use crate::ast::types::CommandNode;
use crate::bindings::{Binding, BindingSpace, ScopedBindings};
use crate::engine::errors::ResolutionError;
use crate::modules::types::{CommandDescriptor, ModuleDescriptor};
use crate::modules::STD_MODULE;

#[derive(Debug, Clone, Copy)]
pub struct ResolvedCommand<'b> {
    /// Name of the MODULE binding the command came from
    pub module_key: &'b str,
    pub module: &'b Arc<ModuleDescriptor>,
    pub command: &'b CommandDescriptor,
}

impl<'b> ResolvedCommand<'b> {
    fn from_binding(binding: &'b Binding, name: &str) -> Option<Self> {
        let module = binding.as_module()?;
        let command = module.command(name)?;
        Some(Self {
            module_key: &binding.name,
            module,
            command,
        })
    }
}

pub fn resolve_command<'b>(
    node: &CommandNode,
    bindings: &'b ScopedBindings,
) -> Result<ResolvedCommand<'b>, ResolutionError> {
    match &node.module {
        Some(prefix) => resolve_prefixed(prefix, node, bindings),
        None => resolve_unprefixed(&node.name, bindings),
    }
}

fn resolve_prefixed<'b>(
    prefix: &str,
    node: &CommandNode,
    bindings: &'b ScopedBindings,
) -> Result<ResolvedCommand<'b>, ResolutionError> {
    let binding = if bindings.alias_target(prefix).is_some() {
        bindings
            .lookup(BindingSpace::Module, prefix)
            .ok_or_else(|| ResolutionError::UnknownAlias {
                alias: prefix.to_string(),
            })?
    } else {
        bindings
            .lookup(BindingSpace::Module, prefix)
            .ok_or_else(|| ResolutionError::UnknownModule {
                module: prefix.to_string(),
            })?
    };

    ResolvedCommand::from_binding(binding, &node.name).ok_or_else(|| {
        ResolutionError::UnknownCommand {
            command: node.qualified_name(),
        }
    })
}

fn resolve_unprefixed<'b>(
    name: &str,
    bindings: &'b ScopedBindings,
) -> Result<ResolvedCommand<'b>, ResolutionError> {
    let preferred = bindings
        .current_module_context()
        .into_iter()
        .chain(Some(STD_MODULE));
    for key in preferred {
        if let Some(found) = bindings
            .lookup(BindingSpace::Module, key)
            .and_then(|binding| ResolvedCommand::from_binding(binding, name))
        {
            return Ok(found);
        }
    }

    let candidates: Vec<ResolvedCommand<'b>> = bindings
        .visible(BindingSpace::Module)
        .into_iter()
        .filter(|b| b.name != STD_MODULE && bindings.alias_target(&b.name).is_none())
        .filter_map(|b| ResolvedCommand::from_binding(b, name))
        .collect();

    match candidates.as_slice() {
        [] => Err(ResolutionError::UnknownCommand {
            command: name.to_string(),
        }),
        [only] => Ok(*only),
        many => Err(ResolutionError::AmbiguousCommand {
            command: name.to_string(),
            candidates: many.iter().map(|c| c.module_key.to_string()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::AST;
    use crate::modules::{aragonos_module, std_module, CommandDescriptor, ModuleDescriptor};

    fn store() -> ScopedBindings {
        let mut store = ScopedBindings::new();
        store.bind(Binding::module(STD_MODULE, Arc::new(std_module(vec![]))));
        store
    }

    fn resolve(store: &ScopedBindings, module: Option<&str>, name: &str) -> Result<String, ResolutionError> {
        let node = AST::command(module, name, vec![]);
        resolve_command(&node, store).map(|r| format!("{}:{}", r.module_key, r.command.name))
    }

    #[test]
    fn test_std_needs_no_prefix() {
        let store = store();
        assert_eq!(resolve(&store, None, "set").unwrap(), "std:set");
        assert_eq!(resolve(&store, Some("std"), "set").unwrap(), "std:set");
    }

    #[test]
    fn test_alias_prefix() {
        let mut store = store();
        store.bind(Binding::module("ar", Arc::new(aragonos_module())));
        store.bind(Binding::alias("ar", "aragonos"));

        assert_eq!(resolve(&store, Some("ar"), "connect").unwrap(), "ar:connect");
        assert_eq!(
            resolve(&store, Some("aragonos"), "connect"),
            Err(ResolutionError::UnknownModule { module: "aragonos".into() })
        );
        // aliased modules are not reachable without their prefix
        assert!(matches!(
            resolve(&store, None, "connect"),
            Err(ResolutionError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_alias_without_module_binding() {
        let mut store = store();
        store.bind(Binding::alias("ar", "aragonos"));
        assert_eq!(
            resolve(&store, Some("ar"), "connect"),
            Err(ResolutionError::UnknownAlias { alias: "ar".into() })
        );
    }

    #[test]
    fn test_unknown_command_in_known_module() {
        let mut store = store();
        store.bind(Binding::module("aragonos", Arc::new(aragonos_module())));
        assert_eq!(
            resolve(&store, Some("aragonos"), "nope"),
            Err(ResolutionError::UnknownCommand { command: "aragonos:nope".into() })
        );
        assert_eq!(resolve(&store, None, "install").unwrap(), "aragonos:install");
    }

    #[test]
    fn test_block_context_wins() {
        let mut store = store();
        store.bind(Binding::module("ar", Arc::new(aragonos_module())));
        store.bind(Binding::alias("ar", "aragonos"));
        store.enter_module_scope("ar");
        assert_eq!(resolve(&store, None, "install").unwrap(), "ar:install");
        // std still reachable inside the block
        assert_eq!(resolve(&store, None, "set").unwrap(), "std:set");
    }

    #[test]
    fn test_ambiguous_unaliased_modules() {
        let mut store = store();
        let other = ModuleDescriptor::new("other").with_command(CommandDescriptor::new("install", ""));
        store.bind(Binding::module("aragonos", Arc::new(aragonos_module())));
        store.bind(Binding::module("other", Arc::new(other)));

        match resolve(&store, None, "install") {
            Err(ResolutionError::AmbiguousCommand { candidates, .. }) => {
                assert_eq!(candidates, vec!["aragonos", "other"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }
}
