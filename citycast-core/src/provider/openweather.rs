use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    config::Endpoints,
    error::WeatherError,
    model::{CityMatch, Condition, Coordinates, DEFAULT_ICON, WeatherReading},
};

use super::WeatherProvider;

const WEATHER_ENDPOINT: &str = "OpenWeather current weather";
const GEOCODING_ENDPOINT: &str = "OpenWeather geocoding";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    endpoints: Endpoints,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, endpoints: Endpoints, timeout: Duration) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            endpoints,
            http,
        })
    }

    async fn fetch_current(&self, location: &[(&str, String)]) -> Result<WeatherReading, WeatherError> {
        let mut query = location.to_vec();
        query.push(("appid", self.api_key.clone()));
        query.push(("units", "metric".to_string()));

        let raw: OwCurrentResponse = self
            .get_json(WEATHER_ENDPOINT, &self.endpoints.weather_url, &query)
            .await?;

        Ok(normalize(raw))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| WeatherError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| WeatherError::Transport { endpoint, source })?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| WeatherError::Parse { endpoint, source })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    temp: Option<f64>,
    feels_like: Option<f64>,
    temp_min: Option<f64>,
    temp_max: Option<f64>,
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWeather {
    id: Option<i64>,
    main: Option<String>,
    description: Option<String>,
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSys {
    country: Option<String>,
    state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    name: Option<String>,
    dt: Option<i64>,
    timezone: Option<i32>,
    sys: Option<OwSys>,
    main: Option<OwMain>,
    weather: Option<Vec<OwWeather>>,
    wind: Option<OwWind>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwGeoCity {
    name: Option<String>,
    state: Option<String>,
    country: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

fn normalize(raw: OwCurrentResponse) -> WeatherReading {
    let sys = raw.sys.unwrap_or_default();
    let main = raw.main.unwrap_or_default();
    let condition = raw
        .weather
        .and_then(|list| list.into_iter().next())
        .map(|w| Condition {
            id: w.id,
            main: w.main,
            description: w.description,
            icon: w.icon,
        })
        .unwrap_or_default();

    let icon = condition
        .icon
        .clone()
        .filter(|icon| !icon.is_empty())
        .unwrap_or_else(|| DEFAULT_ICON.to_string());

    WeatherReading {
        name: raw.name.unwrap_or_default(),
        state: sys.state.unwrap_or_default(),
        country: sys.country.unwrap_or_default(),
        timestamp: raw.dt,
        timezone_offset: raw.timezone,
        temperature: main.temp.unwrap_or(f64::NAN),
        feels_like: main.feels_like.unwrap_or(f64::NAN),
        temp_min: main.temp_min.unwrap_or(f64::NAN),
        temp_max: main.temp_max.unwrap_or(f64::NAN),
        humidity: main.humidity.unwrap_or(f64::NAN),
        wind_speed: raw.wind.and_then(|w| w.speed).unwrap_or(f64::NAN),
        condition,
        icon,
    }
}

fn to_city_match(raw: OwGeoCity) -> Option<CityMatch> {
    let name = raw.name.filter(|n| !n.trim().is_empty())?;
    let coordinates = raw.lat.zip(raw.lon).map(|(latitude, longitude)| Coordinates {
        latitude,
        longitude,
    });

    Some(CityMatch {
        name,
        state: raw.state,
        country: raw.country,
        coordinates,
    })
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_by_city(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        self.fetch_current(&[("q", city.to_string())]).await
    }

    async fn current_by_coords(&self, at: Coordinates) -> Result<WeatherReading, WeatherError> {
        self.fetch_current(&[
            ("lat", at.latitude.to_string()),
            ("lon", at.longitude.to_string()),
        ])
        .await
    }

    async fn search_cities(&self, query: &str, limit: u8) -> Result<Vec<CityMatch>, WeatherError> {
        let params = [
            ("q", query.to_string()),
            ("limit", limit.to_string()),
            ("appid", self.api_key.clone()),
        ];

        let cities: Vec<OwGeoCity> = self
            .get_json(GEOCODING_ENDPOINT, &self.endpoints.geocoding_url, &params)
            .await?;

        Ok(cities.into_iter().filter_map(to_city_match).collect())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
