//! The `std` module
//!
//! Always in scope under the MODULE binding `std`, so its commands need no
//! prefix. `load` is listed here for completion purposes only: the module
//! loader handles it before any eager evaluation runs.

use lazy_static::lazy_static;
use regex_lite::Regex;

use super::types::{
    ArgCompletionContext, CommandDescriptor, EagerContext, EagerFuture, HelperDescriptor,
    ModuleDescriptor,
};
use crate::ast::types::{ArgumentKind, ArgumentNode};
use crate::bindings::{Binding, BindingSpace, ScopedBindings};
use crate::engine::errors::EagerError;

pub const STD_MODULE: &str = "std";

lazy_static! {
    static ref VARIABLE_NAME: Option<Regex> = Regex::new(r"^\$[A-Za-z_][A-Za-z0-9_]*$").ok();
}

const STD_HELPERS: &[(&str, &str)] = &[
    ("date", "Timestamp for a date, with optional offset"),
    ("get", "Read a value from a contract"),
    ("id", "keccak256 of a string"),
    ("ipfs", "Upload text and return its CID"),
    ("me", "Connected account address"),
    ("token", "Token address from a token list symbol"),
    ("token.balance", "Token balance of an account"),
    ("token.amount", "Amount scaled by token decimals"),
];

pub fn is_variable_name(s: &str) -> bool {
    VARIABLE_NAME.as_ref().map_or(false, |re| re.is_match(s))
}

/// Argument text with `$references` resolved through the store. Unknown
/// references keep their raw text.
pub fn resolve_argument(arg: &ArgumentNode, bindings: &ScopedBindings) -> String {
    match arg.kind {
        ArgumentKind::Variable => bindings
            .variable(&arg.raw)
            .map_or_else(|| arg.raw.clone(), str::to_string),
        _ => arg.value().to_string(),
    }
}

/// Build `std`, offering `loadable` as completions for `load`.
pub fn std_module(loadable: Vec<String>) -> ModuleDescriptor {
    let module = ModuleDescriptor::new(STD_MODULE)
        .with_command(
            CommandDescriptor::new("load", "Load a module, optionally under an alias")
                .with_arg_completions(move |ctx: &ArgCompletionContext<'_>| match ctx.index {
                    0 => loadable.clone(),
                    1 => vec!["as".to_string()],
                    _ => Vec::new(),
                }),
        )
        .with_command(
            CommandDescriptor::new("set", "Bind a value to a $variable").with_eager(set_eager),
        )
        .with_command(
            CommandDescriptor::new("exec", "Call a contract function").with_arg_completions(
                |ctx: &ArgCompletionContext<'_>| match ctx.index {
                    0 => ctx.bindings.visible_names(BindingSpace::User),
                    _ => Vec::new(),
                },
            ),
        );

    STD_HELPERS.iter().fold(module, |module, (name, description)| {
        module.with_helper(HelperDescriptor::new(*name, *description))
    })
}

fn set_eager(ctx: EagerContext<'_>) -> EagerFuture<'_> {
    Box::pin(async move {
        let args = &ctx.node.args;
        let target = args.first().ok_or_else(|| EagerError::MissingArgument {
            command: "set".to_string(),
            name: "variable".to_string(),
        })?;
        if !is_variable_name(&target.raw) {
            return Err(EagerError::InvalidArgument {
                command: "set".to_string(),
                value: target.raw.clone(),
                reason: "expected a variable name such as $name".to_string(),
            });
        }
        let value = args.get(1).ok_or_else(|| EagerError::MissingArgument {
            command: "set".to_string(),
            name: "value".to_string(),
        })?;

        Ok(vec![Binding::user(
            target.raw.clone(),
            resolve_argument(value, ctx.bindings),
        )])
    })
}
