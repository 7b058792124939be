//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::crawler::ItemFailure;
use crate::extract::JobRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{FailureRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str = "title, job_id, url, company, location, description, apply_url,
     industry, base_salary, benefits, requirements, skills, work_hours, job_type, job_sector,
     contact";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Running),
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        title: row.get(0)?,
        job_id: row.get(1)?,
        url: row.get(2)?,
        company: row.get(3)?,
        location: row.get(4)?,
        description: row.get(5)?,
        apply_url: row.get(6)?,
        industry: row.get(7)?,
        base_salary: row.get(8)?,
        benefits: row.get(9)?,
        requirements: row.get(10)?,
        skills: row.get(11)?,
        work_hours: row.get(12)?,
        job_type: row.get(13)?,
        job_sector: row.get(14)?,
        contact: row.get(15)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Output =====

    fn insert_record(&mut self, run_id: i64, record: &JobRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            &format!(
                "INSERT INTO job_records (run_id, scraped_at, {})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                 ON CONFLICT(run_id, job_id) DO UPDATE SET
                    title = excluded.title,
                    url = excluded.url,
                    company = excluded.company,
                    location = excluded.location,
                    description = excluded.description,
                    apply_url = excluded.apply_url,
                    industry = excluded.industry,
                    base_salary = excluded.base_salary,
                    benefits = excluded.benefits,
                    requirements = excluded.requirements,
                    skills = excluded.skills,
                    work_hours = excluded.work_hours,
                    job_type = excluded.job_type,
                    job_sector = excluded.job_sector,
                    contact = excluded.contact,
                    scraped_at = excluded.scraped_at",
                RECORD_COLUMNS
            ),
            params![
                run_id,
                now,
                record.title,
                record.job_id,
                record.url,
                record.company,
                record.location,
                record.description,
                record.apply_url,
                record.industry,
                record.base_salary,
                record.benefits,
                record.requirements,
                record.skills,
                record.work_hours,
                record.job_type,
                record.job_sector,
                record.contact,
            ],
        )?;
        Ok(())
    }

    fn insert_failure(&mut self, run_id: i64, failure: &ItemFailure) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO item_failures (run_id, url, listing_url, kind, message, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                failure.url,
                failure.listing_url,
                failure.kind.code(),
                failure.kind.to_string(),
                now
            ],
        )?;
        Ok(())
    }

    fn get_records(&self, run_id: i64) -> StorageResult<Vec<JobRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM job_records WHERE run_id = ?1 ORDER BY job_id",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![run_id], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn get_failures(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, url, listing_url, kind, message, recorded_at
             FROM item_failures WHERE run_id = ?1 ORDER BY id",
        )?;

        let failures = stmt
            .query_map(params![run_id], |row| {
                Ok(FailureRecord {
                    id: row.get(0)?,
                    run_id: row.get(1)?,
                    url: row.get(2)?,
                    listing_url: row.get(3)?,
                    kind: row.get(4)?,
                    message: row.get(5)?,
                    recorded_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(failures)
    }

    // ===== Statistics =====

    fn count_records(&self, run_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM job_records WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_failures_by_kind(&self, run_id: i64) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, COUNT(*) FROM item_failures WHERE run_id = ?1 GROUP BY kind ORDER BY kind",
        )?;

        let counts = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }
}
