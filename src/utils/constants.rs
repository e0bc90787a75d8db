/// Input file and folder names, relative to the data directory
pub const TRIPDATA_DIR: &str = "tripdata";
pub const STATIONS_FILE: &str = "Capital_Bike_Share_Locations.csv";
pub const WEATHER_FILE: &str = "weatherdata.json";

/// Output file stems
pub const RESULTS_STEM: &str = "results";
pub const RESULTS_ALL_STEM: &str = "results_all";

/// Timestamp format shared by trip records and weather observations
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Clustering defaults
pub const DEFAULT_GRID_SIZE: usize = 32;
pub const LOCATION_GRID_SIZE: usize = 4;
pub const DENSE_L1_LABELS: [&str; 4] = ["101", "102", "2", "202"];
/// Tabular placeholder for an undefined L2 label
pub const L2_UNDEFINED: &str = "0";

/// Window defaults (minutes)
pub const DEFAULT_STEP_MINUTES: i64 = 90;
pub const DEFAULT_RETURN_OFFSET_MINUTES: i64 = 30;
pub const WEATHER_LOOKBACK_MINUTES: i64 = 30;
pub const WEATHER_LOOKAHEAD_MINUTES: i64 = 29;
/// Hours before Jan 1 kept when filtering trips to a year
pub const YEAR_FILTER_LEAD_HOURS: i64 = 4;
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 50;

/// Bucketing thresholds (degrees Fahrenheit / percent)
pub const TEMP_THRESHOLDS: [f64; 7] = [0.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0];
pub const HUMIDITY_THRESHOLDS: [f64; 7] = [0.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0];

/// Default years processed by `run`
pub const DEFAULT_YEARS: [i32; 3] = [2017, 2018, 2019];

/// Parquet defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_COMPRESSION: &str = "snappy";
