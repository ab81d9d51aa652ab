//! Binding types
//!
//! A binding is a named value tagged with the space it lives in. The
//! space is derived from the value, so a binding can never be filed under
//! the wrong space.

use std::fmt;
use std::sync::Arc;

use crate::modules::types::ModuleDescriptor;

/// Closed set of binding spaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BindingSpace {
    /// A loaded module, keyed by its alias or default name
    Module,
    /// An alternate name resolving to a module name
    Alias,
    /// A script-defined variable such as `$dao`
    User,
}

impl BindingSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "MODULE",
            Self::Alias => "ALIAS",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for BindingSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum BindingValue {
    Module(Arc<ModuleDescriptor>),
    /// Target module name
    Alias(String),
    User(String),
}

impl PartialEq for BindingValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            // descriptors hold closures, compare by identity
            (Self::Module(a), Self::Module(b)) => Arc::ptr_eq(a, b),
            (Self::Alias(a), Self::Alias(b)) => a == b,
            (Self::User(a), Self::User(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub value: BindingValue,
}

impl Binding {
    pub fn module(name: impl Into<String>, module: Arc<ModuleDescriptor>) -> Self {
        Self {
            name: name.into(),
            value: BindingValue::Module(module),
        }
    }

    pub fn alias(alias: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: alias.into(),
            value: BindingValue::Alias(target.into()),
        }
    }

    pub fn user(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: BindingValue::User(value.into()),
        }
    }

    pub fn space(&self) -> BindingSpace {
        match self.value {
            BindingValue::Module(_) => BindingSpace::Module,
            BindingValue::Alias(_) => BindingSpace::Alias,
            BindingValue::User(_) => BindingSpace::User,
        }
    }

    pub fn as_module(&self) -> Option<&Arc<ModuleDescriptor>> {
        match &self.value {
            BindingValue::Module(module) => Some(module),
            _ => None,
        }
    }

    /// Alias target or user value
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            BindingValue::Alias(s) | BindingValue::User(s) => Some(s),
            BindingValue::Module(_) => None,
        }
    }
}
