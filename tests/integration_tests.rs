use bikeshare_demand::config::PipelineConfig;
use bikeshare_demand::error::Result;
use bikeshare_demand::models::{events_for, ActionRecord, Direction, Station, TripRecord, WeatherObservation};
use bikeshare_demand::processors::demand_calculator::calculate_demand;
use bikeshare_demand::processors::{
    ActionSink, Pipeline, StationClusterer, WeatherNormalizer, WeatherTable, WindowAggregator,
};
use bikeshare_demand::utils::holidays::UsFederalHolidays;
use bikeshare_demand::utils::{STATIONS_FILE, TRIPDATA_DIR, WEATHER_FILE};
use bikeshare_demand::writers::csv_writer::read_demand_table;
use bikeshare_demand::writers::ParquetWriter;
use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[derive(Default)]
struct MemorySink {
    writes: usize,
}

impl ActionSink for MemorySink {
    fn persist(&mut self, _direction: Direction, _year: i32, _rows: &[ActionRecord]) -> Result<()> {
        self.writes += 1;
        Ok(())
    }
}

fn at(h: u32, mi: u32) -> NaiveDateTime {
    // 2018-03-05 is a Monday and not a federal holiday
    NaiveDate::from_ymd_opt(2018, 3, 5)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

#[test]
fn test_single_window_demand() -> Result<()> {
    let stations = vec![
        Station::new(31000, 38.90, -77.03),
        Station::new(31001, 38.90, -77.03),
    ];
    let clusters = StationClusterer::new().build(&stations)?;
    assert_eq!(clusters.clusters.len(), 1);
    assert_eq!(clusters.clusters[0].size, 2);

    let trips = vec![TripRecord {
        start_time: at(0, 5),
        end_time: at(0, 35),
        start_station: 31000,
        end_station: 31001,
    }];
    let observations = vec![WeatherObservation::new(at(0, 0), "Fair", Some(65.0), Some(45.0))];
    let phrases = WeatherNormalizer::new().normalize(&observations);
    let weather = WeatherTable::new(observations, phrases);
    let calendar = UsFederalHolidays::new();

    let mut sink = MemorySink::default();
    let pickup_events = events_for(&trips, Direction::Pickup);
    let (pickups, _) = WindowAggregator::new(Direction::Pickup, &pickup_events, &clusters, &weather, &calendar)
        .run(at(0, 0), at(1, 30), &mut sink, None)?;
    let return_events = events_for(&trips, Direction::Return);
    let (returns, _) = WindowAggregator::new(Direction::Return, &return_events, &clusters, &weather, &calendar)
        .run(at(0, 0), at(1, 30), &mut sink, None)?;

    assert_eq!(sink.writes, 2);
    assert_eq!(pickups[0].rows.len(), 1);
    assert_eq!(pickups[0].rows[0].count, 1);
    assert_eq!(returns[0].rows[0].count, 1);

    let demand = calculate_demand(&pickups[0].rows, &returns[0].rows)?;
    assert_eq!(demand.len(), 1);

    let row = &demand[0];
    assert_eq!(row.demand, 0);
    assert_eq!(row.clear_sky, 1);
    assert_eq!(row.rain, 0);
    assert_eq!(row.temp, 60);
    assert_eq!(row.hum, 40);
    assert_eq!(row.weekday, 1);
    assert_eq!(row.holiday, 0);
    assert_eq!(row.month, 3);
    Ok(())
}

#[test]
fn test_pipeline_combines_years() -> Result<()> {
    let dir = TempDir::new()?;
    let data = dir.path();

    fs::write(
        data.join(STATIONS_FILE),
        "TERMINAL_NUMBER,LATITUDE,LONGITUDE,NUMBER_OF_BIKES,NUMBER_OF_EMPTY_DOCKS\n\
         31000,38.90,-77.03,5,10\n\
         31001,38.90,-77.03,3,8\n\
         31002,38.95,-77.00,7,4\n",
    )?;
    fs::create_dir_all(data.join(TRIPDATA_DIR))?;
    fs::write(
        data.join(TRIPDATA_DIR).join("2018Q1-tripdata.csv"),
        "Duration,Start date,End date,Start station number,End station number,Member type\n\
         1800,2018-03-05 00:05:00,2018-03-05 00:35:00,31000,31001,Member\n\
         900,2018-03-05 00:10:00,2018-03-05 00:25:00,31000,31002,Casual\n",
    )?;
    fs::write(
        data.join(WEATHER_FILE),
        r#"{"observations": [
            {"time_gmt": "2018-01-01 00:00:00", "phrase": "Cloudy", "temp": 20, "humidity": 80},
            {"time_gmt": "2018-03-05 00:00:00", "phrase": "Fair", "temp": 65, "humidity": 45},
            {"time_gmt": "2018-03-05 01:30:00", "phrase": "Light Rain", "temp": 60, "humidity": 90},
            {"time_gmt": "2019-01-01 00:00:00", "phrase": "Snow", "temp": 28, "humidity": 85}
        ]}"#,
    )?;

    let config = PipelineConfig {
        data_dir: data.to_path_buf(),
        years: vec![2018, 2019],
        checkpoint_interval: 2000,
        ..Default::default()
    };
    let summary = Pipeline::new(config).with_silent(true).run()?;

    assert_eq!(summary.integrity.total_stations, 3);
    assert_eq!(summary.phrases, 4);
    let clusters = summary.integrity.total_clusters;
    assert_eq!(summary.combined_rows, (365 + 365) * 16 * clusters);

    let combined = read_demand_table(&summary.csv_path)?;
    assert_eq!(combined.len(), summary.combined_rows);

    // first window of Mar 5: two pickups and one return at the two-station
    // cluster, one return at the single-station cluster
    let windows_before = (31 + 28 + 4) * 16 * clusters;
    let first = &combined[windows_before..windows_before + clusters];
    assert!(first.iter().all(|r| r.clear_sky == 1 && r.temp == 60 && r.hum == 40));
    assert!(first.iter().any(|r| r.demand != 0));

    // the window after picks up the light rain observation
    let next = &combined[windows_before + clusters];
    assert_eq!(next.rain, 2);
    assert_eq!(next.hum, 90);

    let writer = ParquetWriter::new();
    let info = writer.get_file_info(&summary.parquet_path)?;
    assert_eq!(info.total_rows as usize, summary.combined_rows);
    let histogram_total: usize = writer
        .demand_histogram(&summary.parquet_path)?
        .iter()
        .map(|(_, rows)| rows)
        .sum();
    assert_eq!(histogram_total, summary.combined_rows);
    Ok(())
}
