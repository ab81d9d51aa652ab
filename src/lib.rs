//! evmcl-complete - Completion engine for evmcl command scripts
//!
//! Given a script being edited and a cursor position, the engine parses
//! the script, speculatively evaluates the commands before the cursor and
//! returns the completion items that apply at the cursor.

pub mod ast;
pub mod bindings;
pub mod engine;
pub mod external;
pub mod logging;
pub mod modules;
pub mod parser;

pub use ast::types::{Position, Span};
pub use engine::{
    CompletionEngine, CompletionItem, CompletionKind, EngineConfig, PassOutcome, SessionCache,
};
pub use external::{Collaborators, ContentResolver, Provider};
pub use modules::{ModuleRegistry, StaticModuleRegistry};
pub use parser::{parse, ParseError, ParseOutput};
