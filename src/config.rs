use crate::error::{ProcessingError, Result};
use crate::processors::window_aggregator::WindowSettings;
use crate::utils::constants::{
    DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_COMPRESSION, DEFAULT_GRID_SIZE,
    DEFAULT_RETURN_OFFSET_MINUTES, DEFAULT_ROW_GROUP_SIZE, DEFAULT_STEP_MINUTES, DEFAULT_YEARS,
    DENSE_L1_LABELS,
};
use crate::writers::ParquetWriter;
use chrono::Duration;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

/// Prefix of environment overrides, e.g. `BIKESHARE_GRID_SIZE=16`.
pub const ENV_PREFIX: &str = "BIKESHARE";

/// Settings of one pipeline run.
///
/// Sources are layered lowest first: built-in defaults, an optional TOML
/// file, `BIKESHARE_*` environment variables. Command-line flags are applied
/// on top by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,

    #[validate(length(min = 1))]
    pub years: Vec<i32>,

    #[validate(range(min = 1, max = 1000))]
    pub grid_size: usize,

    #[validate(range(min = 1, max = 1440))]
    pub step_minutes: i64,

    #[validate(range(min = 0, max = 1440))]
    pub return_offset_minutes: i64,

    #[validate(range(min = 1))]
    pub checkpoint_interval: usize,

    pub dense_labels: Vec<String>,

    /// Codec of `results_all.parquet`: snappy, gzip, lz4, zstd or none.
    pub compression: String,

    #[validate(range(min = 1))]
    pub row_group_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            years: DEFAULT_YEARS.to_vec(),
            grid_size: DEFAULT_GRID_SIZE,
            step_minutes: DEFAULT_STEP_MINUTES,
            return_offset_minutes: DEFAULT_RETURN_OFFSET_MINUTES,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            dense_labels: DENSE_L1_LABELS.iter().map(|s| s.to_string()).collect(),
            compression: DEFAULT_COMPRESSION.to_string(),
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Load defaults, then `file` if given, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = file {
            if !path.exists() {
                return Err(ProcessingError::Config(format!(
                    "config file '{}' not found",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("years")
                    .with_list_parse_key("dense_labels"),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.check()?;
        debug!(?loaded, "Loaded pipeline configuration");
        Ok(loaded)
    }

    /// Apply command-line overrides and validate the result.
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, years: Option<Vec<i32>>) -> Result<Self> {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(years) = years {
            self.years = years;
        }
        self.check()?;
        Ok(self)
    }

    /// Replace the Parquet codec and validate it.
    pub fn with_compression(mut self, compression: Option<String>) -> Result<Self> {
        if let Some(compression) = compression {
            self.compression = compression;
        }
        self.check()?;
        Ok(self)
    }

    /// Field ranges plus ordering rules the derive cannot express.
    pub fn check(&self) -> Result<()> {
        self.validate()?;

        if let Some(year) = self.years.iter().find(|y| !(1970..=2100).contains(*y)) {
            return Err(ProcessingError::Config(format!("year {} out of range", year)));
        }
        if self.years.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ProcessingError::Config(
                "years must be strictly increasing".to_string(),
            ));
        }
        if self.return_offset_minutes >= self.step_minutes {
            return Err(ProcessingError::Config(format!(
                "return offset {}m must be shorter than the step {}m",
                self.return_offset_minutes, self.step_minutes
            )));
        }
        self.parquet_writer()?;
        Ok(())
    }

    /// Writer for the combined Parquet output.
    pub fn parquet_writer(&self) -> Result<ParquetWriter> {
        Ok(ParquetWriter::new()
            .with_compression(&self.compression)?
            .with_row_group_size(self.row_group_size))
    }

    pub fn window_settings(&self) -> WindowSettings {
        WindowSettings {
            step: Duration::minutes(self.step_minutes),
            return_offset: Duration::minutes(self.return_offset_minutes),
            checkpoint_interval: self.checkpoint_interval,
        }
    }
}
