use crate::models::{PhraseIndicators, WeatherIndicators, WeatherObservation};
use std::collections::HashMap;
use tracing::info;

const WIND: [&str; 1] = ["Windy"];
const WINTRY: [&str; 4] = ["Wintry", "Snow", "Freezing", "Sleet"];
const THUNDER: [&str; 3] = ["T-", "Thunder", "Squalls"];
const EXTREME: [&str; 4] = ["Heavy", "T-Storm", "Thunder", "Squalls"];
const FOGGY: [&str; 3] = ["Fog", "Mist", "Haze"];
const RAIN: [&str; 2] = ["Rain", "Heavy Rain"];
const LIGHT_RAIN: [&str; 3] = ["Light Rain", "Light Drizzle", "Light Freezing Rain"];
const CLEAR_SKY: [&str; 2] = ["Fair", "Partly Cloudy"];

fn contains_any(phrase: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| phrase.contains(term))
}

/// Indicator variables for one weather phrase.
pub fn indicators_for(phrase: &str) -> WeatherIndicators {
    // "Light Rain" also contains "Rain": the heavier class takes precedence
    let rain = if contains_any(phrase, &RAIN) {
        2
    } else if contains_any(phrase, &LIGHT_RAIN) {
        1
    } else {
        0
    };

    WeatherIndicators {
        wind: contains_any(phrase, &WIND),
        wintry: contains_any(phrase, &WINTRY),
        thunderstorm: contains_any(phrase, &THUNDER),
        extreme_weather: contains_any(phrase, &EXTREME),
        foggy: contains_any(phrase, &FOGGY),
        rain,
        clear_sky: contains_any(phrase, &CLEAR_SKY),
    }
}

/// Lookup table from exact phrase to its indicators.
#[derive(Debug, Clone, Default)]
pub struct PhraseTable {
    rows: Vec<PhraseIndicators>,
    index: HashMap<String, usize>,
}

impl PhraseTable {
    pub fn get(&self, phrase: &str) -> Option<&WeatherIndicators> {
        self.index.get(phrase).map(|&i| &self.rows[i].indicators)
    }

    /// Indicators for a phrase, derived on the spot when the table lacks it.
    pub fn lookup(&self, phrase: &str) -> WeatherIndicators {
        self.get(phrase)
            .copied()
            .unwrap_or_else(|| indicators_for(phrase))
    }

    /// Rows ordered by observation count, most frequent first.
    pub fn rows(&self) -> &[PhraseIndicators] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub struct WeatherNormalizer;

impl WeatherNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Build the phrase table from the distinct phrases of the observations.
    pub fn normalize(&self, observations: &[WeatherObservation]) -> PhraseTable {
        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut position: HashMap<&str, usize> = HashMap::new();
        for obs in observations {
            match position.get(obs.phrase.as_str()) {
                Some(&i) => counts[i].1 += 1,
                None => {
                    position.insert(obs.phrase.as_str(), counts.len());
                    counts.push((obs.phrase.clone(), 1));
                }
            }
        }
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let rows: Vec<PhraseIndicators> = counts
            .into_iter()
            .map(|(phrase, count)| PhraseIndicators {
                indicators: indicators_for(&phrase),
                phrase,
                count,
            })
            .collect();
        let index = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (row.phrase.clone(), i))
            .collect();

        info!(
            observations = observations.len(),
            phrases = rows.len(),
            "Normalized weather phrases"
        );

        PhraseTable { rows, index }
    }
}

impl Default for WeatherNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
