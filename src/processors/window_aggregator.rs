use crate::error::{ProcessingError, Result};
use crate::models::{
    ActionRecord, CalendarFeatures, Cluster, Direction, TripEvent, WeatherObservation,
    WindowWeather,
};
use crate::processors::clusterer::ClusterTable;
use crate::processors::weather_normalizer::PhraseTable;
use crate::utils::constants::{
    DEFAULT_CHECKPOINT_INTERVAL, DEFAULT_RETURN_OFFSET_MINUTES, DEFAULT_STEP_MINUTES,
    HUMIDITY_THRESHOLDS, TEMP_THRESHOLDS, WEATHER_LOOKAHEAD_MINUTES, WEATHER_LOOKBACK_MINUTES,
    YEAR_FILTER_LEAD_HOURS,
};
use crate::utils::holidays::HolidayCalendar;
use crate::utils::progress::ProgressReporter;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Largest threshold not above `value`, 0 below all thresholds or when the
/// value is missing.
pub fn bucket(value: Option<f64>, thresholds: &[f64]) -> u32 {
    let Some(v) = value else {
        return 0;
    };
    thresholds
        .iter()
        .rev()
        .find(|&&threshold| v >= threshold)
        .map(|&threshold| threshold as u32)
        .unwrap_or(0)
}

/// Calendar features of a window start.
pub fn calendar_features(t: NaiveDateTime, calendar: &dyn HolidayCalendar) -> CalendarFeatures {
    CalendarFeatures {
        datetime: t,
        holiday: calendar.is_holiday(t.date()),
        weekday: t.weekday().number_from_monday(),
        month: t.month(),
        time: t.time(),
    }
}

/// Where aggregated tables go: checkpoints during a year and the final table
/// at each year boundary and at the end of the run.
pub trait ActionSink {
    fn persist(&mut self, direction: Direction, year: i32, rows: &[ActionRecord]) -> Result<()>;
}

/// Weather observations in time order with the phrase lookup table.
#[derive(Debug, Clone)]
pub struct WeatherTable {
    observations: Vec<WeatherObservation>,
    phrases: PhraseTable,
}

impl WeatherTable {
    pub fn new(mut observations: Vec<WeatherObservation>, phrases: PhraseTable) -> Self {
        observations.sort_by_key(|o| o.timestamp);
        Self {
            observations,
            phrases,
        }
    }

    /// First observation with `from <= timestamp < to`.
    pub fn first_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> Option<&WeatherObservation> {
        let i = self.observations.partition_point(|o| o.timestamp < from);
        self.observations.get(i).filter(|o| o.timestamp < to)
    }

    /// Weather features joined onto a window from one observation.
    pub fn window_weather(&self, obs: &WeatherObservation) -> WindowWeather {
        WindowWeather {
            temperature: obs.temperature,
            humidity: obs.humidity,
            indicators: self.phrases.lookup(&obs.phrase),
            temp_bucket: bucket(obs.temperature, &TEMP_THRESHOLDS),
            hum_bucket: bucket(obs.humidity, &HUMIDITY_THRESHOLDS),
        }
    }
}

/// Window sizes of the aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSettings {
    pub step: Duration,
    pub return_offset: Duration,
    pub checkpoint_interval: usize,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            step: Duration::minutes(DEFAULT_STEP_MINUTES),
            return_offset: Duration::minutes(DEFAULT_RETURN_OFFSET_MINUTES),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
        }
    }
}

impl WindowSettings {
    /// Counting window for a step starting at `t`. Returns are counted
    /// `return_offset` earlier than pickups.
    pub fn window(&self, direction: Direction, t: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        match direction {
            Direction::Pickup => (t, t + self.step),
            Direction::Return => (t - self.return_offset, t + self.step - self.return_offset),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    InitializingYear,
    Accumulating,
    YearBoundaryFlush,
    Done,
}

/// Aggregated rows of one calendar year.
#[derive(Debug, Clone)]
pub struct YearTable {
    pub year: i32,
    pub rows: Vec<ActionRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationSummary {
    pub steps: usize,
    pub rows: usize,
    pub weather_carried_forward: usize,
    pub unmapped_events: usize,
    pub checkpoints: usize,
}

/// Trip events of one direction resolved to clusters, in time order.
fn cluster_events(events: &[TripEvent], clusters: &ClusterTable) -> (Vec<(NaiveDateTime, u32)>, usize) {
    let mut mapped: Vec<(NaiveDateTime, u32)> = events
        .iter()
        .filter_map(|e| clusters.cluster_of(e.station_id).map(|c| (e.timestamp, c)))
        .collect();
    mapped.sort_by_key(|(ts, _)| *ts);
    let unmapped = events.len() - mapped.len();
    (mapped, unmapped)
}

/// Walks `[start, end)` in fixed steps and counts one direction of trip
/// events per cluster, joined with calendar and weather features.
pub struct WindowAggregator<'a> {
    direction: Direction,
    settings: WindowSettings,
    clusters: &'a [Cluster],
    cluster_index: HashMap<u32, usize>,
    events: Vec<(NaiveDateTime, u32)>,
    unmapped_events: usize,
    weather: &'a WeatherTable,
    calendar: &'a dyn HolidayCalendar,
}

impl<'a> WindowAggregator<'a> {
    pub fn new(
        direction: Direction,
        events: &[TripEvent],
        clusters: &'a ClusterTable,
        weather: &'a WeatherTable,
        calendar: &'a dyn HolidayCalendar,
    ) -> Self {
        let (events, unmapped_events) = cluster_events(events, clusters);
        if unmapped_events > 0 {
            warn!(
                direction = %direction,
                unmapped_events,
                "Dropped trip events at stations missing from the station table"
            );
        }
        let cluster_index = clusters
            .clusters
            .iter()
            .enumerate()
            .map(|(i, c)| (c.cluster_id, i))
            .collect();

        Self {
            direction,
            settings: WindowSettings::default(),
            clusters: &clusters.clusters,
            cluster_index,
            events,
            unmapped_events,
            weather,
            calendar,
        }
    }

    pub fn with_settings(mut self, settings: WindowSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Events that any window starting inside `year` can count: from the
    /// lead before Jan 1 (or the return offset, if longer) up to one step
    /// past the next Jan 1.
    fn events_for_year(&self, year: i32) -> &[(NaiveDateTime, u32)] {
        let lead = Duration::hours(YEAR_FILTER_LEAD_HOURS).max(self.settings.return_offset);
        let bounds = NaiveDate::from_ymd_opt(year, 1, 1)
            .zip(NaiveDate::from_ymd_opt(year + 1, 1, 1))
            .map(|(first, next)| {
                (
                    first.and_time(NaiveTime::MIN) - lead,
                    next.and_time(NaiveTime::MIN) + self.settings.step,
                )
            });
        let Some((from, to)) = bounds else {
            return &[];
        };

        let lo = self.events.partition_point(|(ts, _)| *ts < from);
        let hi = self.events.partition_point(|(ts, _)| *ts < to);
        debug!(year, events = hi - lo, "Filtered trip events to year");
        &self.events[lo..hi]
    }

    fn count_window(&self, events: &[(NaiveDateTime, u32)], from: NaiveDateTime, to: NaiveDateTime) -> Vec<u32> {
        let lo = events.partition_point(|(ts, _)| *ts < from);
        let hi = events.partition_point(|(ts, _)| *ts < to);

        let mut counts = vec![0u32; self.clusters.len()];
        for (_, cluster_id) in &events[lo..hi] {
            if let Some(&i) = self.cluster_index.get(cluster_id) {
                counts[i] += 1;
            }
        }
        counts
    }

    /// Weather for the step at `t`. Without an observation near `t` the
    /// previous step's weather is reused.
    fn weather_at(&self, t: NaiveDateTime, previous: Option<&WindowWeather>) -> Result<(WindowWeather, bool)> {
        let from = t - Duration::minutes(WEATHER_LOOKBACK_MINUTES);
        let to = t + Duration::minutes(WEATHER_LOOKAHEAD_MINUTES);

        match (self.weather.first_between(from, to), previous) {
            (Some(obs), _) => Ok((self.weather.window_weather(obs), false)),
            (None, Some(last)) => {
                warn!(window = %t, "No weather observation, using last available weather information");
                Ok((last.clone(), true))
            }
            (None, None) => Err(ProcessingError::MissingWeatherObservation { at: t }),
        }
    }

    /// Rows for one step, one per cluster.
    fn step_rows(&self, events: &[(NaiveDateTime, u32)], t: NaiveDateTime, weather: &WindowWeather) -> Vec<ActionRecord> {
        let (from, to) = self.settings.window(self.direction, t);
        let counts = self.count_window(events, from, to);
        let calendar = calendar_features(t, self.calendar);

        self.clusters
            .iter()
            .zip(counts)
            .map(|(cluster, count)| ActionRecord::new(cluster, &calendar, weather, count))
            .collect()
    }

    /// Run the aggregation over `[start, end)`.
    ///
    /// Every finished calendar year is handed to the sink and returned.
    pub fn run(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
        sink: &mut dyn ActionSink,
        progress: Option<&ProgressReporter>,
    ) -> Result<(Vec<YearTable>, AggregationSummary)> {
        let mut summary = AggregationSummary {
            unmapped_events: self.unmapped_events,
            ..Default::default()
        };
        let mut tables = Vec::new();

        let mut state = AggregatorState::InitializingYear;
        let mut current_year = start.year();
        let mut year_events: &[(NaiveDateTime, u32)] = &[];
        let mut accumulator: Vec<ActionRecord> = Vec::new();
        let mut last_weather: Option<WindowWeather> = None;
        let mut step = 1usize;
        let mut t = start;

        info!(direction = %self.direction, %start, %end, "Aggregating trip events");

        loop {
            state = match state {
                AggregatorState::InitializingYear => {
                    year_events = self.events_for_year(current_year);
                    accumulator.clear();
                    AggregatorState::Accumulating
                }
                AggregatorState::Accumulating if t >= end => {
                    sink.persist(self.direction, current_year, &accumulator)?;
                    summary.rows += accumulator.len();
                    tables.push(YearTable {
                        year: current_year,
                        rows: std::mem::take(&mut accumulator),
                    });
                    AggregatorState::Done
                }
                AggregatorState::Accumulating if t.year() > current_year => {
                    AggregatorState::YearBoundaryFlush
                }
                AggregatorState::Accumulating => {
                    let (weather, carried) = self.weather_at(t, last_weather.as_ref())?;
                    if carried {
                        summary.weather_carried_forward += 1;
                    }
                    accumulator.extend(self.step_rows(year_events, t, &weather));
                    last_weather = Some(weather);

                    if step % self.settings.checkpoint_interval == 0 {
                        debug!(step, rows = accumulator.len(), "Checkpoint");
                        sink.persist(self.direction, current_year, &accumulator)?;
                        summary.checkpoints += 1;
                    }
                    if let Some(p) = progress {
                        p.increment(1);
                    }

                    summary.steps += 1;
                    step += 1;
                    t += self.settings.step;
                    AggregatorState::Accumulating
                }
                AggregatorState::YearBoundaryFlush => {
                    sink.persist(self.direction, current_year, &accumulator)?;
                    summary.rows += accumulator.len();
                    tables.push(YearTable {
                        year: current_year,
                        rows: std::mem::take(&mut accumulator),
                    });
                    current_year = t.year();
                    info!(year = current_year, "Next year, refiltering trip events");
                    AggregatorState::InitializingYear
                }
                AggregatorState::Done => break,
            };
        }

        info!(
            direction = %self.direction,
            steps = summary.steps,
            rows = summary.rows,
            carried_forward = summary.weather_carried_forward,
            "Aggregation complete"
        );

        Ok((tables, summary))
    }
}
