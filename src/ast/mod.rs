//! AST module for command-language scripts

pub mod types;

pub use types::*;
