//! Completion Engine
//!
//! Main entry point. Ties together the parser, the module loader, the
//! eager executor and the completion assembler for one pass.

use std::sync::Arc;

use tracing::{debug, info_span, Instrument};

use crate::ast::types::Position;
use crate::bindings::{Binding, ScopedBindings};
use crate::engine::completion::{assemble, classify, word_range};
use crate::engine::config::EngineConfig;
use crate::engine::eager_execution::EagerExecutor;
use crate::engine::module_loading::{collect_load_requests, load_signature, ModuleLoader};
use crate::engine::session_cache::{PassTicket, SessionCache};
use crate::engine::types::{PassOutcome, PassReport};
use crate::external::Collaborators;
use crate::modules::{std_module, ModuleDescriptor, ModuleRegistry, STD_MODULE};
use crate::parser::parse;

/// Outcome of a pass plus what it observed along the way
#[derive(Debug, Clone, PartialEq)]
pub struct PassResult {
    pub outcome: PassOutcome,
    pub report: PassReport,
}

pub struct CompletionEngine {
    registry: Arc<dyn ModuleRegistry>,
    collaborators: Collaborators,
    config: EngineConfig,
    std: Arc<ModuleDescriptor>,
}

impl CompletionEngine {
    pub fn new(registry: Arc<dyn ModuleRegistry>, collaborators: Collaborators, config: EngineConfig) -> Self {
        let std = Arc::new(std_module(registry.available()));
        Self {
            registry,
            collaborators,
            config,
            std,
        }
    }

    /// Suggestions for `cursor` in `text`.
    pub async fn complete(&self, session: &SessionCache, text: &str, cursor: Position) -> PassOutcome {
        self.run_pass(session, text, cursor).await.outcome
    }

    /// Run a full pass. Never fails: every error met on the way ends up in
    /// the report and at worst shrinks the suggestion list.
    pub async fn run_pass(&self, session: &SessionCache, text: &str, cursor: Position) -> PassResult {
        let ticket = session.begin_pass();
        let span = info_span!("completion_pass", ?ticket, line = cursor.line, column = cursor.column);
        self.pass(session, ticket, text, cursor).instrument(span).await
    }

    async fn pass(
        &self,
        session: &SessionCache,
        ticket: PassTicket,
        text: &str,
        cursor: Position,
    ) -> PassResult {
        let mut report = PassReport::default();

        let parsed = parse(text);
        if !parsed.errors.is_empty() {
            debug!(errors = parsed.errors.len(), "script has parse errors");
        }
        report.parse_errors = parsed.errors;
        let script = parsed.script;

        let line_text = line_at(text, cursor.line);
        let range = word_range(line_text, cursor);

        let mut bindings = ScopedBindings::new();
        bindings.bind(Binding::module(STD_MODULE, self.std.clone()));

        let timeout = self.config.external_call_timeout();
        // the signature covers every load so moving the cursor keeps the cache
        let requests = collect_load_requests(&script);
        let signature = load_signature(&requests);
        let cached = session.cached_modules(&signature);
        let loaded = ModuleLoader::new(self.registry.as_ref(), &self.collaborators, timeout)
            .load(&requests, &cached)
            .await;
        bindings.merge(&loaded.bindings_before(cursor.line));
        let resolved_modules = loaded.bindings();
        report.modules_resolved = loaded.resolved;
        report.load_failures = loaded
            .failures
            .into_iter()
            .filter(|failure| failure.line.map_or(false, |line| line < cursor.line))
            .collect();

        let excluded = self.config.excluded();
        report.execution = EagerExecutor::new(&self.collaborators, timeout, &excluded)
            .execute(&script, cursor, &mut bindings)
            .await;

        let context = classify(&script, line_text, cursor);
        let mut items = assemble(context, &bindings, range);
        if let Some(max) = self.config.max_suggestions {
            items.truncate(max);
        }

        if !session.commit(ticket, signature, &resolved_modules) {
            return PassResult {
                outcome: PassOutcome::Superseded,
                report,
            };
        }

        debug!(items = items.len(), "completion pass finished");
        PassResult {
            outcome: PassOutcome::Completed(items),
            report,
        }
    }
}

/// Text of a zero-based line, empty past the end of input.
fn line_at(text: &str, line: usize) -> &str {
    text.split('\n')
        .nth(line)
        .map_or("", |l| l.strip_suffix('\r').unwrap_or(l))
}
