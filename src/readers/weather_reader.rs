use crate::error::{ProcessingError, Result};
use crate::models::WeatherObservation;
use crate::utils::constants::TIMESTAMP_FORMAT;
use chrono::{DateTime, NaiveDateTime};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WeatherFile {
    Wrapped { observations: Vec<RawObservation> },
    Bare(Vec<RawObservation>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTime {
    Text(String),
    Epoch(i64),
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    time_gmt: RawTime,
    #[serde(default)]
    phrase: Option<String>,
    #[serde(default)]
    temp: Option<f64>,
    #[serde(default)]
    humidity: Option<f64>,
}

impl RawObservation {
    fn parse(self) -> Result<WeatherObservation> {
        let timestamp = match self.time_gmt {
            RawTime::Text(text) => NaiveDateTime::parse_from_str(text.trim(), TIMESTAMP_FORMAT)?,
            RawTime::Epoch(secs) => DateTime::from_timestamp(secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| {
                    ProcessingError::EmptyOrMalformedInput(format!(
                        "weather timestamp {} out of range",
                        secs
                    ))
                })?,
        };

        Ok(WeatherObservation {
            timestamp,
            phrase: self.phrase.unwrap_or_default(),
            temperature: self.temp,
            humidity: self.humidity,
        })
    }
}

pub struct WeatherReader;

impl WeatherReader {
    pub fn new() -> Self {
        Self
    }

    /// Read observations in time order. Accepts `{"observations": [...]}` or
    /// a bare array.
    pub fn read_observations(&self, path: &Path) -> Result<Vec<WeatherObservation>> {
        let file = File::open(path).map_err(|e| {
            ProcessingError::EmptyOrMalformedInput(format!(
                "cannot read weather file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let parsed: WeatherFile = serde_json::from_reader(BufReader::new(file))?;
        self.collect_observations(parsed, path)
    }

    pub fn parse_str(&self, json: &str) -> Result<Vec<WeatherObservation>> {
        let parsed: WeatherFile = serde_json::from_str(json)?;
        self.collect_observations(parsed, Path::new("<inline>"))
    }

    fn collect_observations(&self, parsed: WeatherFile, path: &Path) -> Result<Vec<WeatherObservation>> {
        let raw = match parsed {
            WeatherFile::Wrapped { observations } => observations,
            WeatherFile::Bare(observations) => observations,
        };

        let mut observations = raw
            .into_iter()
            .map(RawObservation::parse)
            .collect::<Result<Vec<_>>>()?;
        if observations.is_empty() {
            return Err(ProcessingError::EmptyOrMalformedInput(format!(
                "no weather observations in '{}'",
                path.display()
            )));
        }
        observations.sort_by_key(|o| o.timestamp);

        info!(path = %path.display(), observations = observations.len(), "Read weather data");
        Ok(observations)
    }
}

impl Default for WeatherReader {
    fn default() -> Self {
        Self::new()
    }
}
