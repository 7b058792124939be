//! JSON Lines export of stored records

use crate::output::traits::OutputResult;
use crate::storage::Storage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes every record of a run as one JSON object per line
///
/// Returns the number of records written.
pub fn export_json_lines<W: Write>(
    storage: &dyn Storage,
    run_id: i64,
    mut writer: W,
) -> OutputResult<usize> {
    let records = storage.get_records(run_id)?;

    for record in &records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    Ok(records.len())
}

/// Writes a run's records to a JSON Lines file, replacing any existing file
pub fn export_json_lines_to_path(
    storage: &dyn Storage,
    run_id: i64,
    path: &Path,
) -> OutputResult<usize> {
    let file = File::create(path)?;
    let count = export_json_lines(storage, run_id, BufWriter::new(file))?;
    tracing::info!("Exported {} record(s) to {}", count, path.display());
    Ok(count)
}
