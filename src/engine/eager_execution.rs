//! Speculative (eager) execution
//!
//! Walks the command tree in source order and asks every command that
//! starts before the cursor line what it would bind, without running it.
//! Block openers push a scope for their children; the scope is popped when
//! the block closes before the cursor and left open when the cursor sits
//! inside it.
//!
//! Failures are per node. An unresolvable command or a failed evaluator
//! contributes nothing, is recorded in the report, and the walk moves on.

use std::slice;
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::ast::types::{BlockNode, CommandNode, Position, ScriptNode};
use crate::bindings::{Binding, ScopedBindings};
use crate::engine::command_resolution::resolve_command;
use crate::engine::errors::{EagerError, ExternalCallError};
use crate::engine::types::{ExecutionReport, NodeFailure};
use crate::external::Collaborators;
use crate::modules::EagerContext;

/// What evaluating a single node produced
struct NodeResult {
    bindings: Vec<Binding>,
    /// MODULE binding key of the resolved command
    module_key: Option<String>,
}

impl NodeResult {
    fn nothing(module_key: Option<String>) -> Self {
        Self {
            bindings: Vec::new(),
            module_key,
        }
    }
}

pub struct EagerExecutor<'a> {
    collaborators: &'a Collaborators,
    timeout: Duration,
    excluded: &'a [&'a str],
}

impl<'a> EagerExecutor<'a> {
    pub fn new(collaborators: &'a Collaborators, timeout: Duration, excluded: &'a [&'a str]) -> Self {
        Self {
            collaborators,
            timeout,
            excluded,
        }
    }

    /// Enrich `bindings` with everything the commands before `cursor`
    /// would have bound. Scopes of blocks enclosing the cursor are still
    /// open when this returns.
    pub async fn execute(
        &self,
        script: &ScriptNode,
        cursor: Position,
        bindings: &mut ScopedBindings,
    ) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        let mut stack: Vec<(slice::Iter<'_, CommandNode>, Option<&BlockNode>)> =
            vec![(script.commands.iter(), None)];

        while let Some((nodes, block)) = stack.last_mut() {
            let Some(node) = nodes.next() else {
                let finished = *block;
                stack.pop();
                match finished {
                    Some(block) if encloses(block, cursor) => break,
                    Some(_) => {
                        if let Err(error) = bindings.exit_scope() {
                            warn!(%error, "scope stack out of sync with block structure");
                            break;
                        }
                    }
                    None => {}
                }
                continue;
            };

            if !node.start_line().map_or(false, |line| line < cursor.line) {
                break;
            }

            let result = self.evaluate(node, bindings, &mut report).await;
            match &node.block {
                Some(child) => {
                    match result.module_key {
                        Some(key) => bindings.enter_module_scope(key),
                        None => bindings.enter_scope(),
                    }
                    bindings.bind_all(result.bindings);
                    stack.push((child.commands.iter(), Some(child)));
                }
                None => bindings.bind_all(result.bindings),
            }
        }

        debug!(
            evaluated = report.evaluated,
            skipped = report.skipped,
            failed = report.failed(),
            "eager execution finished"
        );
        report
    }

    async fn evaluate(
        &self,
        node: &CommandNode,
        bindings: &ScopedBindings,
        report: &mut ExecutionReport,
    ) -> NodeResult {
        if self.excluded.iter().any(|name| node.is_std_command(name)) {
            report.skipped += 1;
            return NodeResult::nothing(None);
        }

        let resolved = match resolve_command(node, bindings) {
            Ok(resolved) => resolved,
            Err(error) => {
                debug!(line = ?node.start_line(), %error, "skipping unresolved command");
                report.skipped += 1;
                report
                    .failures
                    .push(NodeFailure::new(node.qualified_name(), node.start_line(), error));
                return NodeResult::nothing(None);
            }
        };

        let module_key = Some(resolved.module_key.to_string());
        let Some(eager) = resolved.command.eager.clone() else {
            report.skipped += 1;
            return NodeResult::nothing(module_key);
        };

        let ctx = EagerContext {
            node,
            bindings,
            collaborators: self.collaborators,
        };
        let result = match tokio::time::timeout(self.timeout, eager(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(EagerError::from(ExternalCallError::timeout(
                node.qualified_name(),
                self.timeout,
            ))),
        };

        match result {
            Ok(produced) => {
                trace!(command = %node.qualified_name(), bindings = produced.len(), "evaluated");
                report.evaluated += 1;
                NodeResult {
                    bindings: produced,
                    module_key,
                }
            }
            Err(error) => {
                debug!(line = ?node.start_line(), %error, "eager evaluation failed");
                report
                    .failures
                    .push(NodeFailure::new(node.qualified_name(), node.start_line(), error));
                NodeResult::nothing(module_key)
            }
        }
    }
}

/// Whether the cursor is still inside `block` once its children ran out.
fn encloses(block: &BlockNode, cursor: Position) -> bool {
    !block.closed || block.range.map_or(true, |range| cursor < range.end)
}
