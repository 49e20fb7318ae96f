//! Fail-soft facade over a [`WeatherProvider`].
//!
//! Every failure is logged and collapsed into absent data: `None`, an empty
//! list or `false`. Callers cannot tell "not found" from "network down".

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    model::{Coordinates, WeatherReading},
    provider::WeatherProvider,
};

pub const DEFAULT_SUGGESTION_LIMIT: u8 = 5;

#[derive(Debug, Clone)]
pub struct WeatherClient {
    provider: Arc<dyn WeatherProvider>,
    suggestion_limit: u8,
}

impl WeatherClient {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self {
            provider,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
        }
    }

    pub fn with_suggestion_limit(mut self, limit: u8) -> Self {
        self.suggestion_limit = limit;
        self
    }

    #[instrument(skip(self))]
    pub async fn get_weather_by_city(&self, name: &str) -> Option<WeatherReading> {
        match self.provider.current_by_city(name).await {
            Ok(reading) => Some(reading),
            Err(err) => {
                debug!("No weather for city: {err}");
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_weather_by_coords(&self, at: Coordinates) -> Option<WeatherReading> {
        match self.provider.current_by_coords(at).await {
            Ok(reading) => Some(reading),
            Err(err) => {
                debug!("No weather for coordinates: {err}");
                None
            }
        }
    }

    /// "Name, State" labels in provider order; empty on failure.
    #[instrument(skip(self))]
    pub async fn search_city_suggestions(&self, query: &str) -> Vec<String> {
        match self.provider.search_cities(query, self.suggestion_limit).await {
            Ok(hits) => hits.iter().map(|hit| hit.label()).collect(),
            Err(err) => {
                debug!("City search failed: {err}");
                Vec::new()
            }
        }
    }

    /// True when a weather read for `name` succeeds and names a location.
    pub async fn validate_city_weather(&self, name: &str) -> bool {
        self.get_weather_by_city(name)
            .await
            .is_some_and(|reading| reading.has_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;

    #[tokio::test]
    async fn known_city_returns_reading() {
        let client = WeatherClient::new(FakeProvider::new().with_city("Oslo").shared());

        let reading = client.get_weather_by_city("Oslo").await.unwrap();
        assert_eq!(reading.name, "Oslo");
        assert!(client.validate_city_weather("Oslo").await);
    }

    #[tokio::test]
    async fn provider_errors_become_absent_data() {
        let client = WeatherClient::new(FakeProvider::new().failing_search().shared());

        assert!(client.get_weather_by_city("Atlantis").await.is_none());
        assert!(client.search_city_suggestions("Atl").await.is_empty());
        assert!(!client.validate_city_weather("Atlantis").await);
    }

    #[tokio::test]
    async fn nameless_reading_does_not_validate() {
        let client = WeatherClient::new(FakeProvider::new().with_nameless_city("Ghost").shared());

        assert!(client.get_weather_by_city("Ghost").await.is_some());
        assert!(!client.validate_city_weather("Ghost").await);
    }

    #[tokio::test]
    async fn suggestions_are_labelled_and_limited() {
        let provider = FakeProvider::new()
            .with_suggestions(["Springfield, Illinois", "Springfield", "Springfield, Oregon"])
            .shared();
        let client = WeatherClient::new(provider).with_suggestion_limit(2);

        assert_eq!(
            client.search_city_suggestions("Spring").await,
            vec!["Springfield, Illinois", "Springfield"]
        );
    }

    #[tokio::test]
    async fn coordinates_lookup() {
        let here = Coordinates {
            latitude: 59.9,
            longitude: 10.7,
        };
        let client = WeatherClient::new(FakeProvider::new().with_position(here, "Oslo").shared());

        let reading = client.get_weather_by_coords(here).await.unwrap();
        assert_eq!(reading.name, "Oslo");

        let elsewhere = Coordinates {
            latitude: 0.0,
            longitude: 0.0,
        };
        assert!(client.get_weather_by_coords(elsewhere).await.is_none());
    }
}
