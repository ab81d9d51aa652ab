//! Engine types
//!
//! Completion items, pass outcomes and the reports a pass leaves behind.

use serde::Serialize;

use crate::ast::types::Span;
use crate::engine::errors::EngineError;
use crate::parser::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    Command,
    Helper,
    Variable,
    ArgumentValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionItem {
    pub label: String,
    pub insert_text: String,
    /// Text the insertion replaces
    pub range: Span,
    pub kind: CompletionKind,
    /// Module the item comes from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionKind, range: Span) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            label,
            range,
            kind,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Result of one completion pass
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    Completed(Vec<CompletionItem>),
    /// A newer pass started before this one finished. Its results were
    /// discarded.
    Superseded,
}

impl PassOutcome {
    pub fn items(&self) -> Option<&[CompletionItem]> {
        match self {
            Self::Completed(items) => Some(items),
            Self::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// One `load` command, as far as the session cache is concerned
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleLoad {
    pub name: String,
    pub alias: Option<String>,
}

/// Ordered `load` commands preceding the cursor
pub type LoadSignature = Vec<ModuleLoad>;

/// A node whose contribution was dropped
#[derive(Debug, Clone, PartialEq)]
pub struct NodeFailure {
    pub command: String,
    pub line: Option<usize>,
    pub error: EngineError,
}

impl NodeFailure {
    pub fn new(command: impl Into<String>, line: Option<usize>, error: impl Into<EngineError>) -> Self {
        Self {
            command: command.into(),
            line,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionReport {
    /// Nodes whose eager evaluation ran to completion
    pub evaluated: usize,
    /// Nodes with nothing to evaluate: excluded, unresolved, or without an
    /// eager evaluator
    pub skipped: usize,
    pub failures: Vec<NodeFailure>,
}

impl ExecutionReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Everything a pass observed besides its suggestions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub parse_errors: Vec<ParseError>,
    /// Failed loads above the cursor
    pub load_failures: Vec<NodeFailure>,
    /// Modules resolved through the registry during this pass
    pub modules_resolved: usize,
    pub execution: ExecutionReport,
}
