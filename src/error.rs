use chrono::NaiveDateTime;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Pipeline stage a fatal error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Clustering,
    WeatherNormalization,
    WindowAggregation,
    DemandCalculation,
    Combining,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Loading => "loading",
            Stage::Clustering => "clustering",
            Stage::WeatherNormalization => "weather normalization",
            Stage::WindowAggregation => "window aggregation",
            Stage::DemandCalculation => "demand calculation",
            Stage::Combining => "combining",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Empty or malformed input: {0}")]
    EmptyOrMalformedInput(String),

    #[error("Invalid action type '{0}', choose pickups or returns")]
    InvalidActionType(String),

    #[error("No weather observation for window starting {at} and no earlier reading to carry forward")]
    MissingWeatherObservation { at: NaiveDateTime },

    #[error("Cluster {cluster_id} has size zero")]
    ClusterSizeZero { cluster_id: u32 },

    #[error("Cluster integrity error: {0}")]
    ClusterIntegrity(String),

    #[error("Data merge error: {0}")]
    DataMerge(String),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            already @ ProcessingError::Stage { .. } => already,
            other => ProcessingError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }
}

impl From<config::ConfigError> for ProcessingError {
    fn from(err: config::ConfigError) -> Self {
        ProcessingError::Config(err.to_string())
    }
}

/// Tag the error of a `Result` with the stage that produced it.
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T> StageContext<T> for Result<T> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| e.in_stage(stage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_wrapping_names_stage() {
        let err = ProcessingError::ClusterSizeZero { cluster_id: 7 }.in_stage(Stage::DemandCalculation);
        assert_eq!(
            err.to_string(),
            "demand calculation failed: Cluster 7 has size zero"
        );
    }

    #[test]
    fn test_stage_is_not_wrapped_twice() {
        let err = ProcessingError::InvalidActionType("rides".to_string())
            .in_stage(Stage::WindowAggregation)
            .in_stage(Stage::Combining);
        assert!(matches!(
            err,
            ProcessingError::Stage {
                stage: Stage::WindowAggregation,
                ..
            }
        ));
    }
}
