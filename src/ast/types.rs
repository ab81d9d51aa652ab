//! Abstract Syntax Tree (AST) Types for the command language
//!
//! A script is an ordered list of commands. A command is
//! `[module:]name arg...`, optionally followed by a nested block of
//! commands opened with a trailing `(` and closed by a `)` line.

use serde::Serialize;

// =============================================================================
// BASE TYPES
// =============================================================================

/// Zero-based line and column (in characters) inside the script text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Span in source code. The end position is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span covering `start_col..end_col` on a single line.
    pub fn on_line(line: usize, start_col: usize, end_col: usize) -> Self {
        Self {
            start: Position::new(line, start_col),
            end: Position::new(line, end_col),
        }
    }
}

// =============================================================================
// SCRIPT & COMMANDS
// =============================================================================

/// Root node: a complete script
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptNode {
    pub commands: Vec<CommandNode>,
}

/// `[module:]name arg... [( block )]`
#[derive(Debug, Clone, PartialEq)]
pub struct CommandNode {
    /// Module prefix before `:` (alias or module name)
    pub module: Option<String>,
    pub name: String,
    pub args: Vec<ArgumentNode>,
    /// Whole command, including its block when present
    pub range: Option<Span>,
    /// Just the `module:name` part
    pub name_range: Option<Span>,
    pub block: Option<BlockNode>,
}

/// Commands between a trailing `(` and its closing `)`
#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub commands: Vec<CommandNode>,
    pub range: Option<Span>,
    /// False when input ended before the closing `)`
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Bare word: `0xabc`, `voting:new`, `1e18`, `as`
    Literal,
    /// `"..."` or `'...'`
    String,
    /// `$name`
    Variable,
    /// `@name` or `@name(...)`
    Helper,
    /// `[a, b]`
    Array,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentNode {
    pub kind: ArgumentKind,
    /// Source text exactly as written (quotes included)
    pub raw: String,
    pub range: Option<Span>,
}

impl ArgumentNode {
    /// Text with surrounding quotes removed for string arguments.
    pub fn value(&self) -> &str {
        match self.kind {
            ArgumentKind::String => {
                let inner = self.raw.get(1..).unwrap_or("");
                match inner.chars().last() {
                    Some(q) if Some(q) == self.raw.chars().next() => &inner[..inner.len() - q.len_utf8()],
                    _ => inner,
                }
            }
            _ => &self.raw,
        }
    }
}

// =============================================================================
// NODE HELPERS
// =============================================================================

impl CommandNode {
    /// Length of `module:name` in characters.
    pub fn qualified_name_len(&self) -> usize {
        let module_len = self.module.as_ref().map_or(0, |m| m.chars().count() + 1);
        module_len + self.name.chars().count()
    }

    pub fn qualified_name(&self) -> String {
        match &self.module {
            Some(module) => format!("{}:{}", module, self.name),
            None => self.name.clone(),
        }
    }

    pub fn start_line(&self) -> Option<usize> {
        self.range.map(|r| r.start.line)
    }

    /// Whether the command is `name` from the implicit `std` module.
    pub fn is_std_command(&self, name: &str) -> bool {
        self.name == name && self.module.as_deref().map_or(true, |m| m == "std")
    }
}

impl ScriptNode {
    pub fn new(commands: Vec<CommandNode>) -> Self {
        Self { commands }
    }

    /// All commands in ascending source order, nested blocks flattened.
    pub fn flatten(&self) -> Vec<&CommandNode> {
        let mut out = Vec::new();
        flatten_into(&self.commands, &mut out);
        out
    }

    /// The deepest command whose header starts on `line`.
    pub fn command_at_line(&self, line: usize) -> Option<&CommandNode> {
        self.flatten()
            .into_iter()
            .filter(|c| c.start_line() == Some(line))
            .last()
    }
}

fn flatten_into<'a>(commands: &'a [CommandNode], out: &mut Vec<&'a CommandNode>) {
    for command in commands {
        out.push(command);
        if let Some(block) = &command.block {
            flatten_into(&block.commands, out);
        }
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

/// Convenience constructors, mostly used by tests and synthetic trees.
pub struct AST;

impl AST {
    pub fn command(module: Option<&str>, name: &str, args: Vec<ArgumentNode>) -> CommandNode {
        CommandNode {
            module: module.map(str::to_string),
            name: name.to_string(),
            args,
            range: None,
            name_range: None,
            block: None,
        }
    }

    pub fn literal(raw: &str) -> ArgumentNode {
        ArgumentNode {
            kind: ArgumentKind::Literal,
            raw: raw.to_string(),
            range: None,
        }
    }
}
