//! Engine Errors
//!
//! Error taxonomy for a completion pass:
//! - `StructuralError`: misuse of the bindings store (contract violation)
//! - `ResolutionError`: a command node that does not resolve to a module command
//! - `ExternalCallError`: provider or content resolver failure, or timeout
//! - `EagerError`: a speculative evaluation that produced no binding
//! - `ModuleLoadError`: a `load` command that could not be honoured
//!
//! None of these abort a pass. The engine logs them and carries on with a
//! smaller suggestion list.

use std::time::Duration;

use thiserror::Error;

use crate::parser::ParseError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("cannot exit the root scope")]
    ExitRootScope,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Unknown module: {module}")]
    UnknownModule { module: String },

    #[error("Unknown alias: {alias}")]
    UnknownAlias { alias: String },

    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    #[error("Ambiguous command {command}, found in modules: {}", .candidates.join(", "))]
    AmbiguousCommand { command: String, candidates: Vec<String> },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExternalCallError {
    #[error("{operation} timed out after {}ms", .timeout.as_millis())]
    Timeout { operation: String, timeout: Duration },

    #[error("Provider error: {message}")]
    Provider { message: String },

    #[error("Content resolver error: {message}")]
    Content { message: String },
}

impl ExternalCallError {
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EagerError {
    #[error("{command}: missing argument <{name}>")]
    MissingArgument { command: String, name: String },

    #[error("{command}: invalid argument {value}, {reason}")]
    InvalidArgument {
        command: String,
        value: String,
        reason: String,
    },

    #[error("{command}: {message}")]
    Unresolved { command: String, message: String },

    #[error(transparent)]
    External(#[from] ExternalCallError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleLoadError {
    #[error("Module {name} not found")]
    NotFound { name: String },

    #[error("Module {name} already loaded")]
    AlreadyLoaded { name: String },

    #[error("Alias {alias} already in use")]
    AliasInUse { alias: String },

    #[error("Module {name} could not be built: {message}")]
    InvalidContent { name: String, message: String },

    #[error(transparent)]
    External(#[from] ExternalCallError),
}

/// Umbrella error for callers that want a single type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    External(#[from] ExternalCallError),

    #[error(transparent)]
    Eager(#[from] EagerError),

    #[error(transparent)]
    ModuleLoad(#[from] ModuleLoadError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
