pub mod clusterer;
pub mod demand_calculator;
pub mod integrity_checker;
pub mod pipeline;
pub mod reconciler;
pub mod weather_normalizer;
pub mod window_aggregator;

pub use clusterer::{ClusterTable, StationClusterer};
pub use demand_calculator::calculate_demand;
pub use integrity_checker::{ClusterViolation, IntegrityChecker, IntegrityReport, ViolationType};
pub use pipeline::{Pipeline, PipelineInputs, RunSummary, YearSummary};
pub use reconciler::reconcile;
pub use weather_normalizer::{PhraseTable, WeatherNormalizer};
pub use window_aggregator::{
    ActionSink, AggregationSummary, WeatherTable, WindowAggregator, WindowSettings,
};
