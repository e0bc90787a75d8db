pub mod cluster;
pub mod records;
pub mod station;
pub mod trip;
pub mod weather;

pub use cluster::{Cluster, StationAssignment};
pub use records::{
    action_headers, ActionRecord, CalendarFeatures, DemandRecord, WindowWeather, ACTION_COLUMNS,
};
pub use station::Station;
pub use trip::{events_for, Direction, TripEvent, TripRecord};
pub use weather::{PhraseIndicators, WeatherIndicators, WeatherObservation};
