//! Output formatting module
//!
//! Renders test results and run summaries for the terminal.

mod formatter;

pub use formatter::{OutputFormat, ResultFormatter};
