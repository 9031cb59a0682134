use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::model::{
    CurrentConditions, DayForecast, ForecastRequest, ForecastSnapshot, LocationCandidate,
    PlaceName,
};

use super::{ForecastProvider, LocationSearchProvider};

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String) -> Self {
        Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    /// Like [`WeatherApiProvider::new`], but every request fails after `timeout`.
    pub fn with_timeout(api_key: String, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { api_key, base_url: DEFAULT_BASE_URL.to_string(), http })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to WeatherAPI.com ({endpoint})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read WeatherAPI {endpoint} response body"))?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "WeatherAPI {} request failed with status {}: {}",
                endpoint,
                status,
                truncate_body(&body),
            ));
        }

        Ok(body)
    }
}

#[derive(Debug, Deserialize)]
struct WaLocation {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct WaCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct WaCurrent {
    temp_c: f64,
    humidity: u8,
    wind_kph: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaDay {
    avgtemp_c: f64,
    condition: WaCondition,
}

#[derive(Debug, Deserialize)]
struct WaAstro {
    sunrise: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaForecastDay {
    date: NaiveDate,
    day: WaDay,
    astro: Option<WaAstro>,
}

#[derive(Debug, Deserialize)]
struct WaForecast {
    forecastday: Vec<WaForecastDay>,
}

#[derive(Debug, Deserialize)]
struct WaForecastResponse {
    location: WaLocation,
    current: WaCurrent,
    forecast: WaForecast,
}

impl WaForecastResponse {
    fn into_snapshot(self, days: u8) -> ForecastSnapshot {
        let sunrise = self
            .forecast
            .forecastday
            .first()
            .and_then(|d| d.astro.as_ref())
            .and_then(|a| a.sunrise.as_deref())
            .and_then(parse_clock_time);

        let daily = self
            .forecast
            .forecastday
            .into_iter()
            .take(usize::from(days))
            .map(|d| DayForecast {
                date: d.date,
                avg_temperature_c: d.day.avgtemp_c,
                condition: d.day.condition.text,
            })
            .collect();

        ForecastSnapshot {
            current: CurrentConditions {
                temperature_c: self.current.temp_c,
                condition: self.current.condition.text,
                wind_kph: self.current.wind_kph,
                humidity_pct: self.current.humidity,
                sunrise,
            },
            location: PlaceName { name: self.location.name, country: self.location.country },
            daily,
        }
    }
}

#[async_trait]
impl LocationSearchProvider for WeatherApiProvider {
    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>> {
        let body = self.get_json("search.json", &[("q", query)]).await?;

        serde_json::from_str(&body).context("Failed to parse WeatherAPI search JSON")
    }
}

#[async_trait]
impl ForecastProvider for WeatherApiProvider {
    async fn forecast(&self, request: &ForecastRequest) -> Result<ForecastSnapshot> {
        if request.days == 0 {
            anyhow::bail!("Forecast day count must be at least 1");
        }

        let days = request.days.to_string();
        let body = self
            .get_json(
                "forecast.json",
                &[
                    ("q", request.city.as_str()),
                    ("days", days.as_str()),
                    ("aqi", "no"),
                    ("alerts", "no"),
                ],
            )
            .await?;

        let parsed: WaForecastResponse =
            serde_json::from_str(&body).context("Failed to parse WeatherAPI forecast JSON")?;

        if parsed.forecast.forecastday.len() < usize::from(request.days) {
            tracing::debug!(
                city = %request.city,
                requested = request.days,
                returned = parsed.forecast.forecastday.len(),
                "WeatherAPI returned fewer forecast days than requested"
            );
        }

        Ok(parsed.into_snapshot(request.days))
    }
}

/// WeatherAPI reports astronomical times as "06:45 AM".
fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%I:%M %p").ok()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
