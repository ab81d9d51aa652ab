//! Module and command descriptors
//!
//! A command descriptor carries optional capabilities: an eager evaluator
//! that computes the bindings the command would produce, and a per-argument
//! completion function. Callers check for presence before invoking either.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::ast::types::{ArgumentNode, CommandNode};
use crate::bindings::{Binding, ScopedBindings};
use crate::engine::errors::EagerError;
use crate::external::Collaborators;

/// Everything an eager evaluator may read. It never gets write access to
/// the store; it returns the bindings it wants and the executor merges them.
#[derive(Clone, Copy)]
pub struct EagerContext<'a> {
    pub node: &'a CommandNode,
    pub bindings: &'a ScopedBindings,
    pub collaborators: &'a Collaborators,
}

pub type EagerFuture<'a> = BoxFuture<'a, Result<Vec<Binding>, EagerError>>;

/// Side-effect free binding producer
pub type EagerFn = Arc<dyn for<'a> Fn(EagerContext<'a>) -> EagerFuture<'a> + Send + Sync>;

/// Input of a per-argument completion function
pub struct ArgCompletionContext<'a> {
    /// Index of the argument under the cursor
    pub index: usize,
    /// Arguments typed so far
    pub args: &'a [ArgumentNode],
    pub bindings: &'a ScopedBindings,
}

/// Returns candidate values for the argument at `ctx.index`
pub type ArgCompletionFn = Arc<dyn Fn(&ArgCompletionContext<'_>) -> Vec<String> + Send + Sync>;

#[derive(Clone)]
pub struct CommandDescriptor {
    pub name: String,
    pub description: String,
    pub eager: Option<EagerFn>,
    pub arg_completions: Option<ArgCompletionFn>,
}

impl CommandDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            eager: None,
            arg_completions: None,
        }
    }

    pub fn with_eager<F>(mut self, f: F) -> Self
    where
        F: for<'a> Fn(EagerContext<'a>) -> EagerFuture<'a> + Send + Sync + 'static,
    {
        self.eager = Some(Arc::new(f));
        self
    }

    pub fn with_arg_completions<F>(mut self, f: F) -> Self
    where
        F: Fn(&ArgCompletionContext<'_>) -> Vec<String> + Send + Sync + 'static,
    {
        self.arg_completions = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("eager", &self.eager.is_some())
            .field("arg_completions", &self.arg_completions.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperDescriptor {
    pub name: String,
    pub description: String,
}

impl HelperDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    pub name: String,
    pub commands: IndexMap<String, CommandDescriptor>,
    pub helpers: IndexMap<String, HelperDescriptor>,
}

impl ModuleDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: IndexMap::new(),
            helpers: IndexMap::new(),
        }
    }

    pub fn with_command(mut self, command: CommandDescriptor) -> Self {
        self.commands.insert(command.name.clone(), command);
        self
    }

    pub fn with_helper(mut self, helper: HelperDescriptor) -> Self {
        self.helpers.insert(helper.name.clone(), helper);
        self
    }

    pub fn command(&self, name: &str) -> Option<&CommandDescriptor> {
        self.commands.get(name)
    }

    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn helper_names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }
}
