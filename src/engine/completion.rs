//! Completion assembly
//!
//! Classifies the cursor context and builds the suggestion list from the
//! enriched bindings store:
//!   command name  -> variables, then command items
//!   argument      -> argument values, then helpers, then variables
//!   anything else -> helpers, then variables
//!
//! Every item replaces the word under the cursor.

use indexmap::IndexSet;

use crate::ast::types::{CommandNode, Position, ScriptNode, Span};
use crate::bindings::{BindingSpace, ScopedBindings};
use crate::engine::command_resolution::resolve_command;
use crate::engine::types::{CompletionItem, CompletionKind};
use crate::modules::{ArgCompletionContext, STD_MODULE};

/// Characters that end the word being replaced
const WORD_DELIMITERS: &[char] = &['(', ')', '[', ']', ',', '"', '\''];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorContext<'s> {
    CommandName,
    Argument { node: &'s CommandNode, index: usize },
    Default,
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !WORD_DELIMITERS.contains(&c)
}

/// Span of the word around the cursor on `line_text`. Empty when the
/// cursor is not touching a word.
pub fn word_range(line_text: &str, cursor: Position) -> Span {
    let chars: Vec<char> = line_text.chars().collect();
    let column = cursor.column.min(chars.len());

    let mut start = column;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = column;
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }
    Span::on_line(cursor.line, start, end)
}

/// Typing a command name when the line is blank, or when the cursor column
/// falls between the start of the name and the length of `module:name`.
///
/// The upper bound compares a column against a length, so it ignores
/// indentation: with leading whitespace the end of a name no longer counts
/// as part of it. Kept as-is for compatibility.
pub fn is_typing_command_name(node: &CommandNode, cursor: Position) -> bool {
    node.name_range.map_or(false, |range| {
        cursor.column >= range.start.column && cursor.column <= node.qualified_name_len()
    })
}

/// Number of arguments that end strictly before the cursor column.
pub fn argument_index(node: &CommandNode, cursor: Position) -> usize {
    node.args
        .iter()
        .filter(|arg| {
            arg.range
                .map_or(false, |r| r.end.line == cursor.line && r.end.column < cursor.column)
        })
        .count()
}

pub fn classify<'s>(script: &'s ScriptNode, line_text: &str, cursor: Position) -> CursorContext<'s> {
    if script.commands.is_empty() || line_text.trim().is_empty() {
        return CursorContext::CommandName;
    }
    match script.command_at_line(cursor.line) {
        Some(node) if is_typing_command_name(node, cursor) => CursorContext::CommandName,
        Some(node) => CursorContext::Argument {
            node,
            index: argument_index(node, cursor),
        },
        None => CursorContext::Default,
    }
}

pub fn assemble(context: CursorContext<'_>, bindings: &ScopedBindings, range: Span) -> Vec<CompletionItem> {
    match context {
        // no helpers here: a line cannot start with one
        CursorContext::CommandName => {
            let mut items = variable_items(bindings, range);
            items.extend(command_items(bindings, range));
            items
        }
        CursorContext::Argument { node, index } => {
            let mut items = argument_items(node, index, bindings, range);
            items.extend(helper_items(bindings, range));
            items.extend(variable_items(bindings, range));
            items
        }
        CursorContext::Default => {
            let mut items = helper_items(bindings, range);
            items.extend(variable_items(bindings, range));
            items
        }
    }
}

/// Commands of every module in scope. The enclosing block's module and
/// `std` come first and need no prefix; aliased modules are rendered
/// `alias:name`.
pub fn command_items(bindings: &ScopedBindings, range: Span) -> Vec<CompletionItem> {
    let context = bindings.current_module_context();
    let modules = bindings.visible(BindingSpace::Module);
    let rank = |key: &str| {
        if Some(key) == context {
            0
        } else if key == STD_MODULE {
            1
        } else {
            2
        }
    };
    let mut ordered: Vec<_> = modules.into_iter().filter_map(|b| Some((b.name.as_str(), b.as_module()?))).collect();
    // stable: load order is kept within each rank
    ordered.sort_by_key(|(key, _)| rank(*key));

    let mut seen = IndexSet::new();
    let mut items = Vec::new();
    for (key, module) in ordered {
        let prefix = (rank(key) == 2 && bindings.alias_target(key).is_some()).then_some(key);
        for name in module.command_names() {
            let label = match prefix {
                Some(prefix) => format!("{}:{}", prefix, name),
                None => name.to_string(),
            };
            if seen.insert(label.clone()) {
                items.push(CompletionItem::new(label, CompletionKind::Command, range).with_detail(&module.name));
            }
        }
    }
    items
}

pub fn argument_items(
    node: &CommandNode,
    index: usize,
    bindings: &ScopedBindings,
    range: Span,
) -> Vec<CompletionItem> {
    let Ok(resolved) = resolve_command(node, bindings) else {
        return Vec::new();
    };
    let Some(complete) = &resolved.command.arg_completions else {
        return Vec::new();
    };

    let ctx = ArgCompletionContext {
        index,
        args: &node.args[..index.min(node.args.len())],
        bindings,
    };
    let mut seen = IndexSet::new();
    complete(&ctx)
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .map(|value| {
            CompletionItem::new(value, CompletionKind::ArgumentValue, range).with_detail(&resolved.module.name)
        })
        .collect()
}

pub fn helper_items(bindings: &ScopedBindings, range: Span) -> Vec<CompletionItem> {
    let mut seen = IndexSet::new();
    let mut items = Vec::new();
    for binding in bindings.visible(BindingSpace::Module) {
        let Some(module) = binding.as_module() else {
            continue;
        };
        for name in module.helper_names() {
            let label = format!("@{}", name);
            if seen.insert(label.clone()) {
                items.push(CompletionItem::new(label, CompletionKind::Helper, range).with_detail(&module.name));
            }
        }
    }
    items
}

pub fn variable_items(bindings: &ScopedBindings, range: Span) -> Vec<CompletionItem> {
    bindings
        .visible_names(BindingSpace::User)
        .into_iter()
        .map(|name| CompletionItem::new(name, CompletionKind::Variable, range))
        .collect()
}
