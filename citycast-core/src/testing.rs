//! In-memory provider for unit tests.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::{
    error::WeatherError,
    model::{CityMatch, Coordinates, WeatherReading},
    provider::WeatherProvider,
};

#[derive(Debug, Default)]
pub(crate) struct FakeProvider {
    cities: HashMap<String, WeatherReading>,
    delays: HashMap<String, Duration>,
    positions: Vec<(Coordinates, WeatherReading)>,
    suggestions: Vec<CityMatch>,
    search_fails: bool,
    searches: Mutex<Vec<String>>,
    lookups: Mutex<Vec<String>>,
}

fn reading(name: &str) -> WeatherReading {
    let mut reading = WeatherReading::empty();
    reading.name = name.to_string();
    reading.temperature = 12.5;
    reading
}

fn not_found() -> WeatherError {
    WeatherError::Status {
        endpoint: "fake",
        status: StatusCode::NOT_FOUND,
        body: "city not found".to_string(),
    }
}

impl FakeProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_city(mut self, name: &str) -> Self {
        self.cities.insert(name.to_string(), reading(name));
        self
    }

    pub(crate) fn with_cities<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        for name in names {
            self = self.with_city(name);
        }
        self
    }

    /// Responds successfully but without a location name.
    pub(crate) fn with_nameless_city(mut self, name: &str) -> Self {
        self.cities.insert(name.to_string(), reading(""));
        self
    }

    pub(crate) fn with_slow_city(mut self, name: &str, delay: Duration) -> Self {
        self.delays.insert(name.to_string(), delay);
        self.with_city(name)
    }

    pub(crate) fn with_position(mut self, at: Coordinates, name: &str) -> Self {
        self.positions.push((at, reading(name)));
        self
    }

    /// Search results given as labels; "Name, State" is split on the first
    /// comma.
    pub(crate) fn with_suggestions<'a>(mut self, labels: impl IntoIterator<Item = &'a str>) -> Self {
        self.suggestions = labels
            .into_iter()
            .map(|label| {
                let (name, state) = match label.split_once(", ") {
                    Some((name, state)) => (name, Some(state.to_string())),
                    None => (label, None),
                };
                CityMatch {
                    name: name.to_string(),
                    state,
                    country: None,
                    coordinates: None,
                }
            })
            .collect();
        self
    }

    pub(crate) fn failing_search(mut self) -> Self {
        self.search_fails = true;
        self
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn searches(&self) -> Vec<String> {
        self.searches.lock().clone()
    }

    pub(crate) fn lookups(&self) -> Vec<String> {
        self.lookups.lock().clone()
    }
}

#[async_trait]
impl WeatherProvider for FakeProvider {
    async fn current_by_city(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        self.lookups.lock().push(city.to_string());

        if let Some(delay) = self.delays.get(city) {
            tokio::time::sleep(*delay).await;
        }

        self.cities.get(city).cloned().ok_or_else(not_found)
    }

    async fn current_by_coords(&self, at: Coordinates) -> Result<WeatherReading, WeatherError> {
        self.positions
            .iter()
            .find(|(pos, _)| *pos == at)
            .map(|(_, reading)| reading.clone())
            .ok_or_else(not_found)
    }

    async fn search_cities(&self, query: &str, limit: u8) -> Result<Vec<CityMatch>, WeatherError> {
        self.searches.lock().push(query.to_string());

        if self.search_fails {
            return Err(WeatherError::Status {
                endpoint: "fake",
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: String::new(),
            });
        }

        Ok(self
            .suggestions
            .iter()
            .take(usize::from(limit))
            .cloned()
            .collect())
    }
}
