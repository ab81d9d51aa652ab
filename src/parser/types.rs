//! Parser Types and Constants
//!
//! Shared types and limits used by the lexer and the parser.

use thiserror::Error;

use crate::ast::types::{Position, ScriptNode};

// Parser limits to keep per-keystroke parsing bounded
pub const MAX_INPUT_SIZE: usize = 1_000_000; // 1MB max input
pub const MAX_BLOCK_DEPTH: usize = 64; // Max nesting of command blocks

/// A recoverable syntax problem. Parsing never stops on one of these;
/// the tree keeps every command that could still be recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Parse error at {line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }
}

/// Result of parsing a script: the (possibly partial) tree plus every
/// error met on the way.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub script: ScriptNode,
    pub errors: Vec<ParseError>,
}

impl ParseOutput {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
