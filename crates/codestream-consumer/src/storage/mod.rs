//! Shared in-memory repositories
//!
//! Every store serializes its mutations behind one `parking_lot::RwLock`,
//! held only for the duration of a single append. Readers take a snapshot
//! under the read lock, so they see either the pre- or post-state of any
//! append, never a partial one.

mod clone_store;
mod file_store;
mod last_processed;
mod stats_ledger;

pub use clone_store::CloneStore;
pub use file_store::FileStore;
pub use last_processed::LastProcessed;
pub use stats_ledger::StatsLedger;

use std::sync::Arc;

/// Handles to every shared store, created once at service start
#[derive(Debug, Clone, Default)]
pub struct SharedStores {
    pub clones: Arc<CloneStore>,
    pub files: Arc<FileStore>,
    pub stats: Arc<StatsLedger>,
    pub last_processed: Arc<LastProcessed>,
}

impl SharedStores {
    pub fn new() -> Self {
        Self::default()
    }
}
