//! Scoped bindings store
//!
//! Stack-of-scopes environment partitioned into MODULE, ALIAS and USER
//! binding spaces.

pub mod scoped;
pub mod types;

pub use scoped::ScopedBindings;
pub use types::{Binding, BindingSpace, BindingValue};
