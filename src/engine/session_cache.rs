//! Session cache
//!
//! Process-scoped state shared by completion passes: the MODULE bindings
//! last computed for a load signature, and the request sequence that
//! decides which pass is the latest. Only module bindings are kept. ALIAS
//! bindings follow from the signature itself and user variables never
//! outlive a pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::bindings::{Binding, BindingSpace, ScopedBindings};
use crate::engine::types::LoadSignature;
use crate::modules::ModuleDescriptor;

/// Sequence number handed to a pass when it starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PassTicket(u64);

#[derive(Debug, Default)]
struct CacheState {
    signature: Option<LoadSignature>,
    bindings: IndexMap<(BindingSpace, String), Binding>,
}

#[derive(Debug, Default)]
pub struct SessionCache {
    state: RwLock<CacheState>,
    sequence: AtomicU64,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_pass(&self) -> PassTicket {
        PassTicket(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_latest(&self, ticket: PassTicket) -> bool {
        self.sequence.load(Ordering::SeqCst) == ticket.0
    }

    pub fn signature(&self) -> Option<LoadSignature> {
        self.state.read().signature.clone()
    }

    /// Descriptors cached for `signature`, keyed by module name. Empty when
    /// the cache was built for a different signature.
    pub fn cached_modules(&self, signature: &LoadSignature) -> IndexMap<String, Arc<ModuleDescriptor>> {
        let state = self.state.read();
        if state.signature.as_ref() != Some(signature) {
            return IndexMap::new();
        }
        state
            .bindings
            .values()
            .filter_map(Binding::as_module)
            .map(|module| (module.name.clone(), module.clone()))
            .collect()
    }

    /// Write the MODULE bindings of `environment` if `ticket` is
    /// still the latest pass. A new signature replaces the cached bindings;
    /// the same signature merges into them. Returns whether it wrote.
    pub fn commit(&self, ticket: PassTicket, signature: LoadSignature, environment: &ScopedBindings) -> bool {
        let mut state = self.state.write();
        // checked under the write lock so a newer pass cannot slip in between
        if !self.is_latest(ticket) {
            debug!(?ticket, "discarding results of superseded pass");
            return false;
        }

        if state.signature.as_ref() != Some(&signature) {
            debug!(modules = signature.len(), "load signature changed, replacing cached modules");
            state.bindings.clear();
            state.signature = Some(signature);
        }
        for binding in environment.snapshot(&[BindingSpace::Module]) {
            state.bindings.insert((binding.space(), binding.name.clone()), binding);
        }
        true
    }

    pub fn invalidate(&self) {
        debug!("session cache invalidated");
        *self.state.write() = CacheState::default();
    }

    pub fn len(&self) -> usize {
        self.state.read().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::ModuleLoad;
    use crate::modules::aragonos_module;

    fn signature(names: &[&str]) -> LoadSignature {
        names
            .iter()
            .map(|n| ModuleLoad { name: n.to_string(), alias: None })
            .collect()
    }

    fn environment(key: &str) -> ScopedBindings {
        let mut env = ScopedBindings::new();
        env.bind(Binding::module(key, Arc::new(aragonos_module())));
        env.bind(Binding::alias("ignored", "aragonos"));
        env.bind(Binding::user("$ignored", "x"));
        env
    }

    #[test]
    fn test_last_request_wins() {
        let cache = SessionCache::new();
        let first = cache.begin_pass();
        let second = cache.begin_pass();
        assert!(!cache.is_latest(first));
        assert!(cache.is_latest(second));

        assert!(!cache.commit(first, signature(&["aragonos"]), &environment("aragonos")));
        assert!(cache.is_empty());
        assert!(cache.commit(second, signature(&["aragonos"]), &environment("aragonos")));
        assert_eq!(cache.len(), 1); // alias and user bindings are not cached
    }

    #[test]
    fn test_same_signature_merges() {
        let cache = SessionCache::new();
        let sig = signature(&["aragonos"]);
        cache.commit(cache.begin_pass(), sig.clone(), &environment("aragonos"));
        cache.commit(cache.begin_pass(), sig.clone(), &environment("extra"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.cached_modules(&sig).len(), 1); // both keys hold the same module name
    }

    #[test]
    fn test_new_signature_replaces() {
        let cache = SessionCache::new();
        cache.commit(cache.begin_pass(), signature(&["aragonos"]), &environment("aragonos"));
        let sig = signature(&["aragonos", "giveth"]);
        assert!(cache.cached_modules(&sig).is_empty());

        cache.commit(cache.begin_pass(), sig.clone(), &environment("other"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.signature(), Some(sig));
    }

    #[test]
    fn test_invalidate() {
        let cache = SessionCache::new();
        let sig = signature(&["aragonos"]);
        cache.commit(cache.begin_pass(), sig.clone(), &environment("aragonos"));
        cache.invalidate();
        assert!(cache.is_empty());
        assert!(cache.signature().is_none());
        assert!(cache.cached_modules(&sig).is_empty());
    }
}
