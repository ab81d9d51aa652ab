//! Completion engine
//!
//! Command resolution, module loading, speculative execution, completion
//! assembly and the session cache, tied together by `CompletionEngine`.

pub mod command_resolution;
pub mod completion;
pub mod config;
pub mod eager_execution;
pub mod engine;
pub mod errors;
pub mod module_loading;
pub mod session_cache;
pub mod types;

pub use command_resolution::{resolve_command, ResolvedCommand};
pub use completion::CursorContext;
pub use config::EngineConfig;
pub use eager_execution::EagerExecutor;
pub use engine::{CompletionEngine, PassResult};
pub use errors::{
    EagerError, EngineError, ExternalCallError, ModuleLoadError, ResolutionError, StructuralError,
};
pub use module_loading::{LoadRequest, ModuleLoader};
pub use session_cache::{PassTicket, SessionCache};
pub use types::{
    CompletionItem, CompletionKind, ExecutionReport, LoadSignature, ModuleLoad, NodeFailure,
    PassOutcome, PassReport,
};
