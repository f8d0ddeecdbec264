//! Append-only repository of processed file records

use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::FileRecord;

/// Shared file repository
///
/// Records are not deduplicated by name: uploading the same file twice
/// yields two independent records.
#[derive(Debug, Default)]
pub struct FileStore {
    files: RwLock<Vec<Arc<FileRecord>>>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed records
    pub fn count(&self) -> usize {
        self.files.read().len()
    }

    /// Commit one record and return the store's count after the commit
    ///
    /// The returned value is this record's 1-based commit ordinal.
    pub fn append(&self, record: Arc<FileRecord>) -> usize {
        let mut files = self.files.write();
        files.push(record);
        files.len()
    }

    /// Snapshot of all records in commit order
    pub fn iterate(&self) -> Vec<Arc<FileRecord>> {
        self.files.read().clone()
    }

    /// Names of all records in commit order
    pub fn filenames(&self) -> Vec<String> {
        self.files.read().iter().map(|f| f.name.clone()).collect()
    }
}
