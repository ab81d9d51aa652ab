//! Scoped Bindings Store
//!
//! A stack of frames, root first. Lookups walk from the innermost frame
//! outwards; writes always land in the innermost frame. A frame opened by
//! a block command remembers the module that command came from, so
//! unprefixed commands inside the block resolve against it.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::bindings::types::{Binding, BindingSpace};
use crate::engine::errors::StructuralError;
use crate::modules::types::ModuleDescriptor;

#[derive(Debug, Clone, Default)]
struct Frame {
    bindings: IndexMap<(BindingSpace, String), Binding>,
    module_context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScopedBindings {
    frames: Vec<Frame>,
}

impl Default for ScopedBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopedBindings {
    /// A store holding only the (empty) root frame.
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// Number of frames above the root.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn enter_scope(&mut self) {
        self.frames.push(Frame::default());
    }

    /// Enter a scope whose unprefixed commands resolve against `module`.
    pub fn enter_module_scope(&mut self, module: impl Into<String>) {
        self.frames.push(Frame {
            bindings: IndexMap::new(),
            module_context: Some(module.into()),
        });
    }

    pub fn exit_scope(&mut self) -> Result<(), StructuralError> {
        if self.frames.len() <= 1 {
            return Err(StructuralError::ExitRootScope);
        }
        self.frames.pop();
        Ok(())
    }

    /// Insert into the innermost frame, replacing a binding of the same
    /// space and name in that frame. Overwrite policy is up to the caller.
    pub fn bind(&mut self, binding: Binding) {
        let key = (binding.space(), binding.name.clone());
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.insert(key, binding);
        }
    }

    pub fn bind_all(&mut self, bindings: impl IntoIterator<Item = Binding>) {
        for binding in bindings {
            self.bind(binding);
        }
    }

    /// Copy every binding visible in `other` into the innermost frame,
    /// outer frames first so `other`'s own shadowing is preserved.
    pub fn merge(&mut self, other: &ScopedBindings) {
        for frame in &other.frames {
            for binding in frame.bindings.values() {
                self.bind(binding.clone());
            }
        }
    }

    pub fn lookup(&self, space: BindingSpace, name: &str) -> Option<&Binding> {
        let key = (space, name.to_string());
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(&key))
    }

    pub fn module(&self, name: &str) -> Option<&Arc<ModuleDescriptor>> {
        self.lookup(BindingSpace::Module, name)
            .and_then(Binding::as_module)
    }

    /// Module name an alias points to.
    pub fn alias_target(&self, alias: &str) -> Option<&str> {
        self.lookup(BindingSpace::Alias, alias)
            .and_then(Binding::as_text)
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.lookup(BindingSpace::User, name)
            .and_then(Binding::as_text)
    }

    /// Module context of the innermost frame that has one.
    pub fn current_module_context(&self) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.module_context.as_deref())
    }

    /// Every binding of `space` reachable from the innermost frame. Names
    /// keep the position of their outermost definition and the value of
    /// their innermost one.
    pub fn visible(&self, space: BindingSpace) -> Vec<&Binding> {
        let mut seen: IndexMap<&str, &Binding> = IndexMap::new();
        for frame in &self.frames {
            for ((s, name), binding) in &frame.bindings {
                if *s == space {
                    seen.insert(name.as_str(), binding);
                }
            }
        }
        seen.into_values().collect()
    }

    pub fn visible_names(&self, space: BindingSpace) -> Vec<String> {
        self.visible(space)
            .into_iter()
            .map(|b| b.name.clone())
            .collect()
    }

    /// Owned copy of the visible bindings of the given spaces.
    pub fn snapshot(&self, spaces: &[BindingSpace]) -> Vec<Binding> {
        spaces
            .iter()
            .flat_map(|space| self.visible(*space))
            .cloned()
            .collect()
    }
}
