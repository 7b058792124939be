//! SQLite-based record sink implementation
//!
//! This module provides a sink that records crawl events directly to the
//! SQLite storage backend.

use crate::crawler::ItemFailure;
use crate::extract::JobRecord;
use crate::output::stats::summarize_run;
use crate::output::traits::{OutputError, OutputResult, RecordSink, RunSummary};
use crate::storage::{RunStatus, Storage};
use std::sync::{Arc, Mutex, MutexGuard};

/// SQLite-based record sink
///
/// This sink writes every record and failure of one run to the storage
/// backend and summarizes the run from the database contents.
pub struct SqliteSink {
    storage: Arc<Mutex<dyn Storage + Send>>,
    run_id: i64,
}

impl SqliteSink {
    /// Creates a new SQLite sink
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to use
    /// * `run_id` - The current run ID
    pub fn new(storage: Arc<Mutex<dyn Storage + Send>>, run_id: i64) -> Self {
        Self { storage, run_id }
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    fn lock(&self) -> OutputResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
        self.storage
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock storage: {}", e)))
    }
}

impl RecordSink for SqliteSink {
    fn record_job(&self, record: &JobRecord) -> OutputResult<()> {
        self.lock()?.insert_record(self.run_id, record)?;
        Ok(())
    }

    fn record_failure(&self, failure: &ItemFailure) -> OutputResult<()> {
        self.lock()?.insert_failure(self.run_id, failure)?;
        Ok(())
    }

    fn generate_summary(&self) -> OutputResult<RunSummary> {
        let storage = self.lock()?;
        summarize_run(&*storage, self.run_id)
    }

    fn finalize(&self, status: RunStatus) -> OutputResult<()> {
        self.lock()?.finish_run(self.run_id, status)?;
        Ok(())
    }
}
