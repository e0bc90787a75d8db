use crate::error::ProcessingError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which endpoint of a trip is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Pickup,
    Return,
}

impl Direction {
    /// Name of the count column and output file stem.
    pub fn column_name(&self) -> &'static str {
        match self {
            Direction::Pickup => "pickups",
            Direction::Return => "returns",
        }
    }
}

impl FromStr for Direction {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pickup" | "pickups" => Ok(Direction::Pickup),
            "return" | "returns" => Ok(Direction::Return),
            _ => Err(ProcessingError::InvalidActionType(s.to_string())),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A raw trip as read from the trip files.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub start_station: u32,
    pub end_station: u32,
}

impl TripRecord {
    /// The event for one endpoint of this trip.
    pub fn event(&self, direction: Direction) -> TripEvent {
        match direction {
            Direction::Pickup => TripEvent {
                timestamp: self.start_time,
                station_id: self.start_station,
                direction,
            },
            Direction::Return => TripEvent {
                timestamp: self.end_time,
                station_id: self.end_station,
                direction,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripEvent {
    pub timestamp: NaiveDateTime,
    pub station_id: u32,
    pub direction: Direction,
}

/// Expand trips into the events of one direction, ordered by timestamp.
pub fn events_for(trips: &[TripRecord], direction: Direction) -> Vec<TripEvent> {
    let mut events: Vec<TripEvent> = trips.iter().map(|t| t.event(direction)).collect();
    events.sort_by_key(|e| e.timestamp);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("pickups".parse::<Direction>().unwrap(), Direction::Pickup);
        assert_eq!("Return".parse::<Direction>().unwrap(), Direction::Return);
        assert!(matches!(
            "rides".parse::<Direction>(),
            Err(ProcessingError::InvalidActionType(_))
        ));
    }

    #[test]
    fn test_events_use_matching_endpoint() {
        let trips = vec![
            TripRecord {
                start_time: at(9, 0),
                end_time: at(9, 20),
                start_station: 1,
                end_station: 2,
            },
            TripRecord {
                start_time: at(8, 0),
                end_time: at(10, 0),
                start_station: 3,
                end_station: 1,
            },
        ];

        let pickups = events_for(&trips, Direction::Pickup);
        assert_eq!(pickups[0].station_id, 3);
        assert_eq!(pickups[1].timestamp, at(9, 0));

        let returns = events_for(&trips, Direction::Return);
        assert_eq!(returns[0].station_id, 2);
        assert_eq!(returns[1].timestamp, at(10, 0));
    }
}
