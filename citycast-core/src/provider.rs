use crate::{
    Config, ForecastRequest, ForecastSnapshot, LocationCandidate,
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod weatherapi;

/// Resolves a partial city name into an ordered list of candidates.
#[async_trait]
pub trait LocationSearchProvider: Send + Sync + Debug {
    async fn search(&self, query: &str) -> anyhow::Result<Vec<LocationCandidate>>;
}

/// Loads current conditions and a per-day forecast for a city.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn forecast(&self, request: &ForecastRequest) -> anyhow::Result<ForecastSnapshot>;
}

/// Construct the WeatherAPI.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<WeatherApiProvider> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for WeatherAPI.com.\n\
                 Hint: run `citycast configure` or set WEATHERAPI_KEY."
        )
    })?;

    let mut provider = WeatherApiProvider::with_timeout(
        api_key,
        config.request_timeout_secs.map(Duration::from_secs),
    )?;
    if let Some(base_url) = &config.base_url {
        provider = provider.with_base_url(base_url.clone());
    }

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        let cfg = Config::default();
        if std::env::var(crate::config::API_KEY_ENV).is_ok() {
            return;
        }
        let err = provider_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `citycast configure`"));
    }

    #[test]
    fn provider_from_config_works_when_key_set() {
        let cfg = Config { api_key: Some("KEY".to_string()), ..Config::default() };

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }

    #[test]
    fn provider_from_config_honours_base_url() {
        let cfg = Config {
            api_key: Some("KEY".to_string()),
            base_url: Some("http://127.0.0.1:9/v1".to_string()),
            ..Config::default()
        };

        let provider = provider_from_config(&cfg).unwrap();
        assert_eq!(provider.base_url(), "http://127.0.0.1:9/v1");
    }
}
