//! Output sink traits and types
//!
//! This module defines the trait interface for record sinks and the
//! summary of a stored run.

use crate::crawler::{CrawlEvent, ItemFailure};
use crate::extract::JobRecord;
use crate::storage::{RunStatus, StorageError};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("No crawl runs found in database")]
    NoRuns,
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of one stored run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,

    pub records: u64,

    // Failure code -> count, ordered by code
    pub failures_by_kind: Vec<(String, u64)>,
}

impl RunSummary {
    /// Total number of item failures
    pub fn total_failures(&self) -> u64 {
        self.failures_by_kind.iter().map(|(_, count)| count).sum()
    }

    /// Share of items that became records, as a percentage
    pub fn success_rate(&self) -> f64 {
        let items = self.records + self.total_failures();
        if items == 0 {
            return 0.0;
        }
        (self.records as f64 / items as f64) * 100.0
    }
}

/// Destination for the events of a crawl run
///
/// Implementations must be thread-safe.
pub trait RecordSink {
    /// Records an extracted job
    fn record_job(&self, record: &JobRecord) -> OutputResult<()>;

    /// Records a skipped item
    fn record_failure(&self, failure: &ItemFailure) -> OutputResult<()>;

    /// Records any crawl event
    fn record_event(&self, event: &CrawlEvent) -> OutputResult<()> {
        match event {
            CrawlEvent::Record(record) => self.record_job(record),
            CrawlEvent::Failure(failure) => self.record_failure(failure),
        }
    }

    /// Generates a summary of the run recorded so far
    fn generate_summary(&self) -> OutputResult<RunSummary>;

    /// Finalizes the output with the run's final status
    fn finalize(&self, status: RunStatus) -> OutputResult<()>;
}
