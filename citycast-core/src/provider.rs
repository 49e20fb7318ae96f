use crate::{
    Config, WeatherError,
    model::{CityMatch, Coordinates, WeatherReading},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Read access to a weather service.
///
/// Implementations report every failure as an error; deciding what a failure
/// means to the user is left to [`crate::WeatherClient`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city name.
    async fn current_by_city(&self, city: &str) -> Result<WeatherReading, WeatherError>;

    /// Current conditions at a position.
    async fn current_by_coords(&self, at: Coordinates) -> Result<WeatherReading, WeatherError>;

    /// Geocoding search, at most `limit` hits, in provider order.
    async fn search_cities(&self, query: &str, limit: u8) -> Result<Vec<CityMatch>, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `citycast configure` and enter your OpenWeather API key."
        )
    })?;

    let provider = OpenWeatherProvider::new(
        api_key.to_owned(),
        config.endpoints.clone(),
        config.timeout(),
    )?;

    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BUILD_API_KEY, Config};

    #[test]
    fn provider_from_config_errors_when_missing_api_key() {
        if BUILD_API_KEY.is_some() {
            return;
        }

        let cfg = Config::default();
        let err = provider_from_config(&cfg).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `citycast configure`"));
    }

    #[test]
    fn provider_from_config_works_when_configured() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".to_string());

        let provider = provider_from_config(&cfg);
        assert!(provider.is_ok());
    }
}
