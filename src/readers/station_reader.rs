use crate::error::{ProcessingError, Result};
use crate::models::Station;
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize)]
struct StationRow {
    #[serde(rename = "TERMINAL_NUMBER")]
    terminal_number: u32,
    #[serde(rename = "LATITUDE")]
    latitude: f64,
    #[serde(rename = "LONGITUDE")]
    longitude: f64,
    #[serde(rename = "NUMBER_OF_BIKES", default)]
    bikes: Option<u32>,
    #[serde(rename = "NUMBER_OF_EMPTY_DOCKS", default)]
    empty_docks: Option<u32>,
}

impl StationRow {
    fn into_station(self) -> Station {
        let capacity = match (self.bikes, self.empty_docks) {
            (Some(bikes), Some(docks)) => Some(bikes + docks),
            _ => None,
        };
        Station::new(self.terminal_number, self.latitude, self.longitude).with_capacity(capacity)
    }
}

pub struct StationReader;

impl StationReader {
    pub fn new() -> Self {
        Self
    }

    /// Read the station reference table.
    pub fn read_stations(&self, path: &Path) -> Result<Vec<Station>> {
        let mut reader = csv::Reader::from_path(path).map_err(|e| {
            ProcessingError::EmptyOrMalformedInput(format!(
                "cannot read station file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let mut stations = Vec::new();
        for row in reader.deserialize::<StationRow>() {
            let station = row?.into_station();
            station.validate()?;
            stations.push(station);
        }

        if stations.is_empty() {
            return Err(ProcessingError::EmptyOrMalformedInput(format!(
                "no stations in '{}'",
                path.display()
            )));
        }

        info!(path = %path.display(), stations = stations.len(), "Read stations");
        Ok(stations)
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}
