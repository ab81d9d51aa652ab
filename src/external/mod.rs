//! External collaborators: blockchain provider and content resolver

pub mod offline;
pub mod types;

pub use offline::{MemoryContentResolver, OfflineProvider};
pub use types::{Collaborators, ContentResolver, Provider};
