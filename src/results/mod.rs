//! Results persistence module
//!
//! Stores and exports run summaries.

mod storage;

pub use storage::{ExportFormat, ResultsStorage, StoredRun};
