pub mod station_reader;
pub mod trip_reader;
pub mod weather_reader;

pub use station_reader::StationReader;
pub use trip_reader::TripReader;
pub use weather_reader::WeatherReader;
