use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result, Stage, StageContext};
use crate::models::{
    events_for, ActionRecord, Direction, Station, TripEvent, TripRecord, WeatherObservation,
};
use crate::processors::clusterer::{ClusterTable, StationClusterer};
use crate::processors::demand_calculator::calculate_demand;
use crate::processors::integrity_checker::{IntegrityChecker, IntegrityReport};
use crate::processors::weather_normalizer::{PhraseTable, WeatherNormalizer};
use crate::processors::window_aggregator::{AggregationSummary, WeatherTable, WindowAggregator};
use crate::readers::{StationReader, TripReader, WeatherReader};
use crate::utils::constants::{STATIONS_FILE, TRIPDATA_DIR, WEATHER_FILE};
use crate::utils::filename::{results_all_csv_path, results_all_parquet_path, results_path};
use crate::utils::holidays::{HolidayCalendar, UsFederalHolidays};
use crate::utils::progress::ProgressReporter;
use crate::writers::csv_writer::{read_demand_table, write_atomic};
use crate::writers::TableWriter;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Raw inputs of a run.
#[derive(Debug, Clone)]
pub struct PipelineInputs {
    pub stations: Vec<Station>,
    pub trips: Vec<TripRecord>,
    pub observations: Vec<WeatherObservation>,
}

#[derive(Debug, Clone)]
pub struct YearSummary {
    pub year: i32,
    pub pickups: AggregationSummary,
    pub returns: AggregationSummary,
    pub demand_rows: usize,
    pub results_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub integrity: IntegrityReport,
    pub phrases: usize,
    pub years: Vec<YearSummary>,
    pub combined_rows: usize,
    pub csv_path: PathBuf,
    pub parquet_path: PathBuf,
}

struct Prepared {
    trips: Vec<TripRecord>,
    clusters: ClusterTable,
    integrity: IntegrityReport,
    phrase_count: usize,
    weather: WeatherTable,
}

/// The batch: load, cluster, normalize weather, aggregate every year in both
/// directions, compute demand, combine.
pub struct Pipeline {
    config: PipelineConfig,
    calendar: Box<dyn HolidayCalendar>,
    silent: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            calendar: Box::new(UsFederalHolidays::new()),
            silent: false,
        }
    }

    pub fn with_calendar(mut self, calendar: Box<dyn HolidayCalendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Hide progress bars, for tests and non-interactive runs.
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn load_stations(&self) -> Result<Vec<Station>> {
        StationReader::new()
            .read_stations(&self.config.data_dir.join(STATIONS_FILE))
            .stage(Stage::Loading)
    }

    pub fn load_observations(&self) -> Result<Vec<WeatherObservation>> {
        WeatherReader::new()
            .read_observations(&self.config.data_dir.join(WEATHER_FILE))
            .stage(Stage::Loading)
    }

    pub fn load_inputs(&self) -> Result<PipelineInputs> {
        let stations = self.load_stations()?;
        let trips = TripReader::new()
            .read_trips(&self.config.data_dir.join(TRIPDATA_DIR))
            .stage(Stage::Loading)?;
        let observations = self.load_observations()?;

        Ok(PipelineInputs {
            stations,
            trips,
            observations,
        })
    }

    /// Cluster table checked for integrity before any aggregation uses it.
    pub fn build_clusters(&self, stations: &[Station]) -> Result<(ClusterTable, IntegrityReport)> {
        let table = StationClusterer::new()
            .with_grid_size(self.config.grid_size)
            .with_dense_labels(self.config.dense_labels.clone())
            .build(stations)
            .stage(Stage::Clustering)?;
        let report = IntegrityChecker::new()
            .ensure_valid(&table)
            .stage(Stage::Clustering)?;
        Ok((table, report))
    }

    pub fn normalize_weather(&self, observations: &[WeatherObservation]) -> Result<PhraseTable> {
        let phrases = WeatherNormalizer::new().normalize(observations);
        if phrases.is_empty() {
            return Err(ProcessingError::EmptyOrMalformedInput(
                "no weather phrases to normalize".to_string(),
            ))
            .stage(Stage::WeatherNormalization);
        }
        Ok(phrases)
    }

    /// Load and cluster the inputs and build the weather table.
    fn prepare(&self) -> Result<Prepared> {
        let inputs = self.load_inputs()?;
        let (clusters, integrity) = self.build_clusters(&inputs.stations)?;
        let phrases = self.normalize_weather(&inputs.observations)?;
        let phrase_count = phrases.len();

        Ok(Prepared {
            trips: inputs.trips,
            clusters,
            integrity,
            phrase_count,
            weather: WeatherTable::new(inputs.observations, phrases),
        })
    }

    fn aggregator<'a>(
        &'a self,
        direction: Direction,
        events: &[TripEvent],
        prepared: &'a Prepared,
    ) -> WindowAggregator<'a> {
        WindowAggregator::new(
            direction,
            events,
            &prepared.clusters,
            &prepared.weather,
            self.calendar.as_ref(),
        )
        .with_settings(self.config.window_settings())
    }

    pub fn run(&self) -> Result<RunSummary> {
        let started = Instant::now();
        info!(
            data_dir = %self.config.data_dir.display(),
            years = ?self.config.years,
            "Starting bikeshare demand pipeline"
        );

        let prepared = self.prepare()?;
        let pickup_events = events_for(&prepared.trips, Direction::Pickup);
        let return_events = events_for(&prepared.trips, Direction::Return);
        let pickups = self.aggregator(Direction::Pickup, &pickup_events, &prepared);
        let returns = self.aggregator(Direction::Return, &return_events, &prepared);

        let mut writer = TableWriter::new(&self.config.data_dir);
        let mut years = Vec::with_capacity(self.config.years.len());
        for &year in &self.config.years {
            let (start, end) = year_bounds(year)?;

            let (pickup_rows, pickup_summary) = self.aggregate(&pickups, year, start, end, &mut writer)?;
            let (return_rows, return_summary) = self.aggregate(&returns, year, start, end, &mut writer)?;

            let demand = calculate_demand(&pickup_rows, &return_rows).stage(Stage::DemandCalculation)?;
            let results_path = writer
                .write_results(year, &demand)
                .stage(Stage::DemandCalculation)?;
            info!(year, rows = demand.len(), path = %results_path.display(), "Wrote yearly demand");

            years.push(YearSummary {
                year,
                pickups: pickup_summary,
                returns: return_summary,
                demand_rows: demand.len(),
                results_path,
            });
        }

        let combined_rows = self.combine()?;

        info!(
            years = years.len(),
            rows = combined_rows,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Pipeline complete"
        );

        Ok(RunSummary {
            integrity: prepared.integrity,
            phrases: prepared.phrase_count,
            years,
            combined_rows,
            csv_path: results_all_csv_path(&self.config.data_dir),
            parquet_path: results_all_parquet_path(&self.config.data_dir),
        })
    }

    /// Aggregate one direction over one year and write its action table.
    /// `direction` is `pickups` or `returns`.
    pub fn aggregate_direction(&self, direction: &str, year: i32) -> Result<AggregationSummary> {
        let direction: Direction = direction.parse()?;
        let (start, end) = year_bounds(year)?;
        info!(%direction, year, "Aggregating a single direction");

        let prepared = self.prepare()?;
        let events = events_for(&prepared.trips, direction);
        let aggregator = self.aggregator(direction, &events, &prepared);

        let mut writer = TableWriter::new(&self.config.data_dir);
        let (_, summary) = self.aggregate(&aggregator, year, start, end, &mut writer)?;
        Ok(summary)
    }

    fn aggregate(
        &self,
        aggregator: &WindowAggregator<'_>,
        year: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        writer: &mut TableWriter,
    ) -> Result<(Vec<ActionRecord>, AggregationSummary)> {
        let steps = (end - start).num_minutes() / self.config.step_minutes;
        let progress = ProgressReporter::new(
            steps.max(0) as u64,
            &format!("Aggregating {} {}", aggregator.direction(), year),
            self.silent,
        );

        let (tables, summary) = aggregator
            .run(start, end, writer, Some(&progress))
            .stage(Stage::WindowAggregation)?;
        progress.finish_with_message(&format!("{} {}: {} rows", aggregator.direction(), year, summary.rows));

        let rows = tables
            .into_iter()
            .find(|t| t.year == year)
            .map(|t| t.rows)
            .unwrap_or_default();
        Ok((rows, summary))
    }

    /// Concatenate the yearly demand tables into `results_all.csv` and
    /// `results_all.parquet`, one year in memory at a time.
    pub fn combine(&self) -> Result<usize> {
        let data_dir = &self.config.data_dir;
        let writer = TableWriter::new(data_dir);

        let csv_path = results_all_csv_path(data_dir);
        let mut rows = 0;
        write_atomic(&csv_path, |out| {
            let mut csv_writer = csv::Writer::from_writer(out);
            for &year in &self.config.years {
                let table = writer.read_results(year)?;
                rows += table.len();
                for record in &table {
                    csv_writer.serialize(record)?;
                }
            }
            csv_writer.flush()?;
            Ok(())
        })
        .stage(Stage::Combining)?;

        let parquet_path = results_all_parquet_path(data_dir);
        let tables = self
            .config
            .years
            .iter()
            .map(|&year| read_demand_table(&results_path(data_dir, year)));
        self.config
            .parquet_writer()
            .and_then(|writer| writer.write_tables(tables, &parquet_path))
            .stage(Stage::Combining)?;

        info!(
            rows,
            csv = %csv_path.display(),
            parquet = %parquet_path.display(),
            "Combined yearly demand tables"
        );
        Ok(rows)
    }
}

/// `[Jan 1 of year, Jan 1 of year + 1)`
pub fn year_bounds(year: i32) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    let next = NaiveDate::from_ymd_opt(year + 1, 1, 1);
    match (first, next) {
        (Some(first), Some(next)) => Ok((first.and_time(NaiveTime::MIN), next.and_time(NaiveTime::MIN))),
        _ => Err(ProcessingError::Config(format!("year {} out of range", year))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::holidays::NoHolidays;
    use crate::utils::filename::action_table_path;
    use crate::writers::csv_writer::read_action_table;
    use std::fs;
    use tempfile::TempDir;

    fn write_inputs(dir: &std::path::Path, weather: &str) -> std::io::Result<()> {
        fs::write(
            dir.join(STATIONS_FILE),
            "TERMINAL_NUMBER,LATITUDE,LONGITUDE\n31000,38.90,-77.03\n31001,38.90,-77.03\n",
        )?;
        fs::create_dir_all(dir.join(TRIPDATA_DIR))?;
        fs::write(
            dir.join(TRIPDATA_DIR).join("2018-tripdata.csv"),
            "Duration,Start date,End date,Start station number,End station number\n\
             1800,2018-03-05 00:05:00,2018-03-05 00:35:00,31000,31001\n",
        )?;
        fs::write(dir.join(WEATHER_FILE), weather)
    }

    fn pipeline(dir: &std::path::Path) -> Pipeline {
        let config = PipelineConfig {
            data_dir: dir.to_path_buf(),
            years: vec![2018],
            checkpoint_interval: 1000,
            ..Default::default()
        };
        Pipeline::new(config)
            .with_calendar(Box::new(NoHolidays))
            .with_silent(true)
    }

    #[test]
    fn test_year_bounds() -> Result<()> {
        let (start, end) = year_bounds(2020)?;
        assert_eq!(start.to_string(), "2020-01-01 00:00:00");
        assert_eq!(end.to_string(), "2021-01-01 00:00:00");
        Ok(())
    }

    #[test]
    fn test_run_writes_every_table() -> Result<()> {
        let dir = TempDir::new()?;
        write_inputs(
            dir.path(),
            r#"[{"time_gmt": "2018-01-01 00:00:00", "phrase": "Fair", "temp": 65, "humidity": 45}]"#,
        )?;

        let summary = pipeline(dir.path()).run()?;

        assert_eq!(summary.integrity.total_clusters, 1);
        assert_eq!(summary.years.len(), 1);
        assert_eq!(summary.years[0].pickups.steps, 365 * 16);
        assert_eq!(summary.combined_rows, 365 * 16);

        let pickups = read_action_table(&action_table_path(dir.path(), Direction::Pickup, 2018))?;
        assert_eq!(pickups.len(), 365 * 16);
        assert_eq!(pickups.iter().map(|r| r.count).sum::<u32>(), 1);

        assert!(summary.csv_path.exists());
        assert!(summary.parquet_path.exists());
        Ok(())
    }

    #[test]
    fn test_combined_parquet_uses_configured_codec() -> Result<()> {
        let dir = TempDir::new()?;
        write_inputs(
            dir.path(),
            r#"[{"time_gmt": "2018-01-01 00:00:00", "phrase": "Fair", "temp": 65, "humidity": 45}]"#,
        )?;
        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            years: vec![2018],
            checkpoint_interval: 1000,
            compression: "gzip".to_string(),
            row_group_size: 1000,
            ..Default::default()
        };

        let summary = Pipeline::new(config)
            .with_calendar(Box::new(NoHolidays))
            .with_silent(true)
            .run()?;

        let info = crate::writers::ParquetWriter::new().get_file_info(&summary.parquet_path)?;
        assert!(matches!(info.compression, parquet::basic::Compression::GZIP(_)));
        assert_eq!(info.row_groups, 6);
        assert_eq!(info.row_group_sizes.iter().sum::<i64>(), 365 * 16);
        Ok(())
    }

    #[test]
    fn test_aggregate_direction_writes_one_table() -> Result<()> {
        let dir = TempDir::new()?;
        write_inputs(
            dir.path(),
            r#"[{"time_gmt": "2018-01-01 00:00:00", "phrase": "Fair", "temp": 65, "humidity": 45}]"#,
        )?;

        let summary = pipeline(dir.path()).aggregate_direction("returns", 2018)?;

        assert_eq!(summary.steps, 365 * 16);
        let returns = read_action_table(&action_table_path(dir.path(), Direction::Return, 2018))?;
        assert_eq!(returns.iter().map(|r| r.count).sum::<u32>(), 1);
        assert!(!action_table_path(dir.path(), Direction::Pickup, 2018).exists());
        Ok(())
    }

    #[test]
    fn test_aggregate_direction_rejects_unknown_action() {
        let dir = TempDir::new().unwrap();
        let err = pipeline(dir.path()).aggregate_direction("rides", 2018).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidActionType(ref a) if a == "rides"));
    }

    #[test]
    fn test_missing_first_weather_names_stage() -> Result<()> {
        let dir = TempDir::new()?;
        write_inputs(
            dir.path(),
            r#"[{"time_gmt": "2018-06-01 00:00:00", "phrase": "Fair", "temp": 65, "humidity": 45}]"#,
        )?;

        let err = pipeline(dir.path()).run().unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Stage {
                stage: Stage::WindowAggregation,
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn test_missing_station_file_fails_loading() {
        let dir = TempDir::new().unwrap();
        let err = pipeline(dir.path()).run().unwrap_err();
        assert!(matches!(
            err,
            ProcessingError::Stage {
                stage: Stage::Loading,
                ..
            }
        ));
    }
}
