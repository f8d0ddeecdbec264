//! Pointer to the most recently completed file

use parking_lot::RwLock;

use crate::timer::TimerSnapshot;
use crate::types::ProcessedFile;

/// Last-writer-wins pointer to the latest completion
///
/// Under concurrent completions the winner is whichever invocation publishes
/// last, which need not match upload arrival order.
#[derive(Debug, Default)]
pub struct LastProcessed {
    current: RwLock<Option<ProcessedFile>>,
}

impl LastProcessed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, file: ProcessedFile) {
        *self.current.write() = Some(file);
    }

    pub fn get(&self) -> Option<ProcessedFile> {
        self.current.read().clone()
    }

    pub fn timers(&self) -> Option<TimerSnapshot> {
        self.current.read().as_ref().map(|f| f.timers.clone())
    }
}
