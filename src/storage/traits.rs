//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::crawler::ItemFailure;
use crate::extract::JobRecord;
use crate::storage::{FailureRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed to keep the output of a
/// crawl. Records and failures always belong to a run.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Sets the final status of a run and stamps its finish time
    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    // ===== Output =====

    /// Stores a job record
    ///
    /// A second record with the same job id in the same run replaces the first.
    fn insert_record(&mut self, run_id: i64, record: &JobRecord) -> StorageResult<()>;

    /// Stores an item failure
    fn insert_failure(&mut self, run_id: i64, failure: &ItemFailure) -> StorageResult<()>;

    /// Gets all records of a run, ordered by job id
    fn get_records(&self, run_id: i64) -> StorageResult<Vec<JobRecord>>;

    /// Gets all failures of a run in the order they were stored
    fn get_failures(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>>;

    // ===== Statistics =====

    /// Counts the records of a run
    fn count_records(&self, run_id: i64) -> StorageResult<u64>;

    /// Counts the failures of a run per failure kind, ordered by kind
    fn count_failures_by_kind(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>>;
}
