//! External collaborator types
//!
//! The engine never talks to a chain or a content network itself. It only
//! threads these handles through to module resolution and to the eager
//! evaluators of commands that need on-chain or off-chain state.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::engine::errors::ExternalCallError;

/// Read-only blockchain endpoint.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Resolve an ENS-style name to an address. `Ok(None)` means the name
    /// is not registered.
    async fn resolve_name(&self, name: &str) -> Result<Option<String>, ExternalCallError>;
}

/// Content-addressed storage, used to fetch remote module sources.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    async fn fetch(&self, address: &str) -> Result<String, ExternalCallError>;
}

/// Handles passed to module resolution and eager evaluation.
#[derive(Clone)]
pub struct Collaborators {
    pub provider: Arc<dyn Provider>,
    pub resolver: Arc<dyn ContentResolver>,
}

impl Collaborators {
    pub fn new(provider: Arc<dyn Provider>, resolver: Arc<dyn ContentResolver>) -> Self {
        Self { provider, resolver }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
