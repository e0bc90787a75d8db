use crate::models::{Cluster, Direction, WeatherIndicators};
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Columns of an aggregated pickups/returns table, without the trailing count
/// column whose name depends on the direction.
pub const ACTION_COLUMNS: [&str; 20] = [
    "cluster_id",
    "cluster_size",
    "L1",
    "L2",
    "holiday",
    "weekday",
    "datetime",
    "time",
    "month",
    "temperature",
    "humidity",
    "wind",
    "wintry",
    "thunderstorm",
    "extreme_weather",
    "foggy",
    "rain",
    "clear_sky",
    "temp",
    "hum",
];

/// Full header row for a direction, with the count column last.
pub fn action_headers(direction: Direction) -> Vec<&'static str> {
    let mut headers = ACTION_COLUMNS.to_vec();
    headers.push(direction.column_name());
    headers
}

/// Calendar features of one window start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    pub datetime: NaiveDateTime,
    pub holiday: bool,
    pub weekday: u32,
    pub month: u32,
    pub time: NaiveTime,
}

/// Weather joined onto one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowWeather {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub indicators: WeatherIndicators,
    pub temp_bucket: u32,
    pub hum_bucket: u32,
}

/// Events of one direction counted for one cluster in one window.
///
/// Field order is the column order of the persisted table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub cluster_id: u32,
    pub cluster_size: u32,
    #[serde(rename = "L1")]
    pub l1: String,
    #[serde(rename = "L2")]
    pub l2: String,
    pub holiday: u8,
    pub weekday: u32,
    pub datetime: NaiveDateTime,
    pub time: NaiveTime,
    pub month: u32,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind: u8,
    pub wintry: u8,
    pub thunderstorm: u8,
    pub extreme_weather: u8,
    pub foggy: u8,
    pub rain: u8,
    pub clear_sky: u8,
    pub temp: u32,
    pub hum: u32,
    #[serde(alias = "pickups", alias = "returns")]
    pub count: u32,
}

impl ActionRecord {
    pub fn new(
        cluster: &Cluster,
        calendar: &CalendarFeatures,
        weather: &WindowWeather,
        count: u32,
    ) -> Self {
        let ind = &weather.indicators;
        Self {
            cluster_id: cluster.cluster_id,
            cluster_size: cluster.size,
            l1: cluster.l1.clone(),
            l2: cluster.l2.clone(),
            holiday: calendar.holiday as u8,
            weekday: calendar.weekday,
            datetime: calendar.datetime,
            time: calendar.time,
            month: calendar.month,
            temperature: weather.temperature,
            humidity: weather.humidity,
            wind: ind.wind as u8,
            wintry: ind.wintry as u8,
            thunderstorm: ind.thunderstorm as u8,
            extreme_weather: ind.extreme_weather as u8,
            foggy: ind.foggy as u8,
            rain: ind.rain,
            clear_sky: ind.clear_sky as u8,
            temp: weather.temp_bucket,
            hum: weather.hum_bucket,
            count,
        }
    }
}

/// Final per-window, per-cluster demand row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub cluster_id: u32,
    #[serde(rename = "L1")]
    pub l1: String,
    #[serde(rename = "L2")]
    pub l2: String,
    pub weekday: u32,
    pub holiday: u8,
    pub time: NaiveTime,
    pub month: u32,
    pub clear_sky: u8,
    pub extreme_weather: u8,
    pub hum: u32,
    pub rain: u8,
    pub temp: u32,
    pub wind: u8,
    pub wintry: u8,
    pub demand: i64,
}

impl DemandRecord {
    /// Project the shared feature columns of an aggregated row.
    pub fn from_features(row: &ActionRecord, demand: i64) -> Self {
        Self {
            cluster_id: row.cluster_id,
            l1: row.l1.clone(),
            l2: row.l2.clone(),
            weekday: row.weekday,
            holiday: row.holiday,
            time: row.time,
            month: row.month,
            clear_sky: row.clear_sky,
            extreme_weather: row.extreme_weather,
            hum: row.hum,
            rain: row.rain,
            temp: row.temp,
            wind: row.wind,
            wintry: row.wintry,
            demand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_column_is_last() {
        let headers = action_headers(Direction::Return);
        assert_eq!(headers.len(), 21);
        assert_eq!(headers.last(), Some(&"returns"));
        assert_eq!(headers[0], "cluster_id");
    }
}
