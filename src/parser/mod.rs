//! Parser module for command-language scripts
//!
//! This module contains the lexer and the tolerant parser.

pub mod types;
pub mod lexer;
pub mod parser;

// Re-exports
pub use types::{ParseError, ParseOutput};
pub use lexer::{Lexer, Token, TokenType};
pub use parser::{parse, Parser};
