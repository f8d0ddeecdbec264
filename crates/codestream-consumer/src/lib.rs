//! codestream-consumer: ingestion and orchestration core of a clone-detection service
//!
//! Uploaded source files are accepted over HTTP and each one is driven through
//! an asynchronous analysis pipeline on its own task. Results land in shared
//! in-memory stores (clones, files, timing history) that the report pages read.

pub mod config;
pub mod engine;
pub mod error;
pub mod processing;
pub mod server;
pub mod storage;
pub mod timer;
pub mod types;

pub use config::ConsumerConfig;
pub use engine::{AnalysisEngine, CloneDetector};
pub use error::{Error, Result};
pub use processing::{Completion, Pipeline};
pub use server::{state::AppState, ConsumerServer};
pub use storage::SharedStores;
pub use types::{CloneGroup, CloneTarget, FileRecord, SourceFile, Stage, TimingEntry};
