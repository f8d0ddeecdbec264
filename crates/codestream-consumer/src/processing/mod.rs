//! Per-upload pipeline orchestration and periodic reporting

mod pipeline;
mod report;

pub use pipeline::{Completion, Pipeline};
pub use report::OperationalSummary;
