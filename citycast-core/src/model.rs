use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Opaque identifier assigned by the location search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u64);

/// One entry of a location search result. Never mutated by the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub country: String,
}

impl LocationCandidate {
    /// "Name, Country" as shown in the candidate list.
    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceName {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: f64,
    pub condition: String,
    pub wind_kph: f64,
    pub humidity_pct: u8,
    /// Sunrise of day 0 in the location's local time.
    pub sunrise: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub date: NaiveDate,
    pub avg_temperature_c: f64,
    pub condition: String,
}

impl DayForecast {
    /// Long English weekday name, e.g. "Monday".
    pub fn weekday(&self) -> String {
        self.date.format("%A").to_string()
    }
}

/// Current conditions plus a chronological per-day forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSnapshot {
    pub current: CurrentConditions,
    pub location: PlaceName,
    pub daily: Vec<DayForecast>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub city: String,
    pub days: u8,
}

impl ForecastRequest {
    pub fn new(city: impl Into<String>, days: u8) -> Self {
        Self { city: city.into(), days }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekday_uses_long_english_name() {
        let day = DayForecast {
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            avg_temperature_c: 21.4,
            condition: "Sunny".into(),
        };
        assert_eq!(day.weekday(), "Monday");
    }

    #[test]
    fn candidate_label_and_json_shape() {
        let json = r#"{"id":2801268,"name":"London","region":"City of London, Greater London",
            "country":"United Kingdom","lat":51.52,"lon":-0.11}"#;
        let candidate: LocationCandidate = serde_json::from_str(json).unwrap();

        assert_eq!(candidate.id, LocationId(2801268));
        assert_eq!(candidate.label(), "London, United Kingdom");
    }
}
