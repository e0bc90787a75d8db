use crate::error::Result;
use crate::models::{action_headers, ActionRecord, DemandRecord, Direction};
use crate::processors::window_aggregator::ActionSink;
use crate::utils::filename::{action_table_path, results_path};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Write a file through a temporary sibling and rename it into place, so a
/// reader never observes a partially written table.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;

    let mut temp = NamedTempFile::new_in(&dir)?;
    write(temp.as_file_mut())?;
    temp.as_file_mut().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Serialize records with their derived header row.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    write_atomic(path, |out| {
        let mut writer = csv::Writer::from_writer(out);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    })
}

/// Write an aggregated table with the direction's count column last.
pub fn write_action_table(path: &Path, direction: Direction, rows: &[ActionRecord]) -> Result<()> {
    write_atomic(path, |out| {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(out);
        writer.write_record(action_headers(direction))?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(())
    })
}

pub fn read_action_table(path: &Path) -> Result<Vec<ActionRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<ActionRecord>()
        .map(|row| Ok(row?))
        .collect()
}

pub fn read_demand_table(path: &Path) -> Result<Vec<DemandRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<DemandRecord>()
        .map(|row| Ok(row?))
        .collect()
}

/// Tables of one run, laid out under the data directory.
pub struct TableWriter {
    data_dir: PathBuf,
}

impl TableWriter {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn write_results(&self, year: i32, records: &[DemandRecord]) -> Result<PathBuf> {
        let path = results_path(&self.data_dir, year);
        write_records(&path, records)?;
        debug!(path = %path.display(), rows = records.len(), "Wrote demand table");
        Ok(path)
    }

    pub fn read_results(&self, year: i32) -> Result<Vec<DemandRecord>> {
        read_demand_table(&results_path(&self.data_dir, year))
    }
}

impl ActionSink for TableWriter {
    fn persist(&mut self, direction: Direction, year: i32, rows: &[ActionRecord]) -> Result<()> {
        let path = action_table_path(&self.data_dir, direction, year);
        write_action_table(&path, direction, rows)?;
        debug!(path = %path.display(), rows = rows.len(), "Saved aggregated table");
        Ok(())
    }
}
