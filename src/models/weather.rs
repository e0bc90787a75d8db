use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One weather reading. Readings are irregularly spaced in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub timestamp: NaiveDateTime,
    pub phrase: String,
    /// Degrees Fahrenheit
    pub temperature: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
}

impl WeatherObservation {
    pub fn new(
        timestamp: NaiveDateTime,
        phrase: impl Into<String>,
        temperature: Option<f64>,
        humidity: Option<f64>,
    ) -> Self {
        Self {
            timestamp,
            phrase: phrase.into(),
            temperature,
            humidity,
        }
    }
}

/// Indicator variables derived from a weather phrase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherIndicators {
    pub wind: bool,
    pub wintry: bool,
    pub thunderstorm: bool,
    pub extreme_weather: bool,
    pub foggy: bool,
    /// 0 = dry, 1 = light rain, 2 = rain
    pub rain: u8,
    pub clear_sky: bool,
}

/// Row of the phrase lookup table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseIndicators {
    pub phrase: String,
    /// Number of observations carrying this phrase
    pub count: usize,
    pub indicators: WeatherIndicators,
}
