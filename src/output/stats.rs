//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! run statistics from the storage layer.

use crate::output::traits::{OutputError, OutputResult, RunSummary};
use crate::storage::Storage;
use chrono::{DateTime, Utc};

/// Builds the summary of one run
pub(crate) fn summarize_run(storage: &dyn Storage, run_id: i64) -> OutputResult<RunSummary> {
    let run = storage.get_run(run_id)?;

    let duration_seconds = match (
        run.started_at.parse::<DateTime<Utc>>(),
        run.finished_at.as_deref().map(str::parse::<DateTime<Utc>>),
    ) {
        (Ok(started), Some(Ok(finished))) => Some((finished - started).num_seconds().max(0) as u64),
        _ => None,
    };

    Ok(RunSummary {
        run_id: run.id,
        started_at: run.started_at,
        finished_at: run.finished_at,
        duration_seconds,
        status: run.status.to_db_string().to_string(),
        config_hash: run.config_hash,
        records: storage.count_records(run_id)?,
        failures_by_kind: storage.count_failures_by_kind(run_id)?,
    })
}

/// Loads statistics for the most recent run
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(RunSummary)` - Successfully loaded statistics
/// * `Err(OutputError)` - No runs stored or the query failed
pub fn load_statistics(storage: &dyn Storage) -> OutputResult<RunSummary> {
    let run = storage.get_latest_run()?.ok_or(OutputError::NoRuns)?;
    summarize_run(storage, run.id)
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &RunSummary) {
    println!("=== Crawl Statistics ===\n");

    println!("Run {}:", stats.run_id);
    println!("  Status: {}", stats.status);
    println!("  Started: {}", stats.started_at);
    if let Some(finished) = &stats.finished_at {
        println!("  Finished: {}", finished);
    }
    if let Some(seconds) = stats.duration_seconds {
        println!("  Duration: {}s", seconds);
    }
    println!("  Config hash: {}", stats.config_hash);
    println!();

    println!("Output:");
    println!("  Job records: {}", stats.records);
    println!("  Item failures: {}", stats.total_failures());
    println!();

    if !stats.failures_by_kind.is_empty() {
        println!("Failure Summary:");
        let mut counts: Vec<_> = stats.failures_by_kind.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} items extracted)",
        stats.success_rate(),
        stats.records,
        stats.records + stats.total_failures()
    );
}
