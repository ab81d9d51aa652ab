//! Modules: descriptors, the registry and the built-in `std` and
//! `aragonos` modules

pub mod aragonos;
pub mod registry;
pub mod std_module;
pub mod types;

pub use aragonos::{aragonos_module, ARAGONOS_MODULE};
pub use registry::{ModuleRegistry, ModuleSource, StaticModuleRegistry};
pub use std_module::{std_module, STD_MODULE};
pub use types::{
    ArgCompletionContext, ArgCompletionFn, CommandDescriptor, EagerContext, EagerFn, EagerFuture,
    HelperDescriptor, ModuleDescriptor,
};
