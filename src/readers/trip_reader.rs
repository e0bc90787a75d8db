use crate::error::{ProcessingError, Result};
use crate::models::TripRecord;
use crate::utils::constants::TIMESTAMP_FORMAT;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct TripRow {
    #[serde(rename = "Start date")]
    start_date: String,
    #[serde(rename = "End date")]
    end_date: String,
    #[serde(rename = "Start station number")]
    start_station: u32,
    #[serde(rename = "End station number")]
    end_station: u32,
}

impl TripRow {
    fn parse(self) -> Result<TripRecord> {
        Ok(TripRecord {
            start_time: NaiveDateTime::parse_from_str(self.start_date.trim(), TIMESTAMP_FORMAT)?,
            end_time: NaiveDateTime::parse_from_str(self.end_date.trim(), TIMESTAMP_FORMAT)?,
            start_station: self.start_station,
            end_station: self.end_station,
        })
    }
}

pub struct TripReader;

impl TripReader {
    pub fn new() -> Self {
        Self
    }

    /// Files of the trip folder in name order.
    pub fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ProcessingError::EmptyOrMalformedInput(format!(
                "cannot read trip folder '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn read_file(&self, path: &Path) -> Result<Vec<TripRecord>> {
        let mut reader = csv::Reader::from_path(path)?;
        reader
            .deserialize::<TripRow>()
            .map(|row| row?.parse())
            .collect()
    }

    /// Read and concatenate every trip file of the folder.
    pub fn read_trips(&self, dir: &Path) -> Result<Vec<TripRecord>> {
        let files = self.list_files(dir)?;
        if files.is_empty() {
            return Err(ProcessingError::EmptyOrMalformedInput(format!(
                "no trip files in '{}'",
                dir.display()
            )));
        }

        let mut trips = Vec::new();
        for file in &files {
            let month = self.read_file(file)?;
            debug!(file = %file.display(), total = trips.len(), rows = month.len(), "Read trip file");
            trips.extend(month);
        }

        info!(files = files.len(), trips = trips.len(), "Read trip data");
        Ok(trips)
    }
}

impl Default for TripReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "Duration,Start date,End date,Start station number,Start station,End station number,End station,Bike number,Member type";

    #[test]
    fn test_read_trip_folder_in_name_order() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("201802-tripdata.csv"),
            format!("{}\n300,2018-02-01 08:00:00,2018-02-01 08:05:00,31000,A,31001,B,W1,Member\n", HEADER),
        )?;
        fs::write(
            dir.path().join("201801-tripdata.csv"),
            format!("{}\n600,2018-01-01 00:05:00,2018-01-01 00:15:00,31001,B,31000,A,W2,Casual\n", HEADER),
        )?;

        let trips = TripReader::new().read_trips(dir.path())?;

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].start_station, 31001);
        assert_eq!(trips[1].end_station, 31001);
        assert_eq!(
            trips[0].end_time,
            NaiveDateTime::parse_from_str("2018-01-01 00:15:00", TIMESTAMP_FORMAT).unwrap()
        );
        Ok(())
    }

    #[test]
    fn test_bad_timestamp_is_fatal() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join("trips.csv"),
            format!("{}\n300,01/02/2018 08:00,2018-02-01 08:05:00,31000,A,31001,B,W1,Member\n", HEADER),
        )?;

        let result = TripReader::new().read_trips(dir.path());
        assert!(matches!(result, Err(ProcessingError::DateParse(_))));
        Ok(())
    }

    #[test]
    fn test_empty_folder_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let result = TripReader::new().read_trips(dir.path());
        assert!(matches!(
            result,
            Err(ProcessingError::EmptyOrMalformedInput(_))
        ));
        Ok(())
    }
}
