//! Output module for persisting and reporting crawl results
//!
//! This module handles:
//! - Recording crawl events through a sink until the run ends
//! - Exporting stored records as JSON Lines
//! - Loading and printing run statistics

mod jsonl;
mod persist;
mod sqlite_output;
pub mod stats;
mod traits;

pub use jsonl::{export_json_lines, export_json_lines_to_path};
pub use persist::persist_crawl;
pub use sqlite_output::SqliteSink;
pub use stats::{load_statistics, print_statistics};
pub use traits::{OutputError, OutputResult, RecordSink, RunSummary};
