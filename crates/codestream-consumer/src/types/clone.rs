//! Clone groups found by match detection

use serde::{Deserialize, Serialize};

/// Another location where a clone recurs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneTarget {
    pub name: String,
    pub start_line: usize,
}

/// One detected duplication, anchored in the file that was being processed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneGroup {
    pub source_name: String,
    pub source_start_line: usize,
    pub source_end_line: usize,
    pub original_code: String,
    pub targets: Vec<CloneTarget>,
}

impl CloneGroup {
    pub fn line_span(&self) -> usize {
        self.source_end_line + 1 - self.source_start_line
    }
}
