use serde::{Deserialize, Serialize};

/// Icon shown when the provider does not report one.
pub const DEFAULT_ICON: &str = "01d";

/// A point on the globe, as returned by a [`crate::Geolocator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One geocoding search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityMatch {
    pub name: String,
    pub state: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl CityMatch {
    /// Suggestion label: "Name, State", or just "Name" without a state.
    pub fn label(&self) -> String {
        match self.state.as_deref().map(str::trim) {
            Some(state) if !state.is_empty() => format!("{}, {state}", self.name),
            _ => self.name.clone(),
        }
    }
}

/// Weather condition as reported by the provider.
///
/// Every field is optional; a payload without a condition entry normalizes to
/// `Condition::default()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: Option<i64>,
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

/// Current conditions for one location.
///
/// Built once by normalizing a provider payload and replaced wholesale on the
/// next successful fetch. Defaulting rules for absent fields:
///
/// - `name`, `state`, `country`: empty string
/// - `timestamp`, `timezone_offset`: `None`
/// - temperatures, `humidity`, `wind_speed`: `f64::NAN`
/// - `condition`: [`Condition::default()`]
/// - `icon`: the condition's icon, else [`DEFAULT_ICON`]
///
/// Temperatures are in Celsius, wind speed in metres per second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub name: String,
    pub state: String,
    pub country: String,
    /// Observation time, Unix seconds.
    pub timestamp: Option<i64>,
    /// Offset of the location's local time from UTC, in seconds.
    pub timezone_offset: Option<i32>,
    pub temperature: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub condition: Condition,
    pub icon: String,
}

impl WeatherReading {
    /// A reading with every field absent.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            state: String::new(),
            country: String::new(),
            timestamp: None,
            timezone_offset: None,
            temperature: f64::NAN,
            feels_like: f64::NAN,
            temp_min: f64::NAN,
            temp_max: f64::NAN,
            humidity: f64::NAN,
            wind_speed: f64::NAN,
            condition: Condition::default(),
            icon: DEFAULT_ICON.to_string(),
        }
    }

    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// "Name, State", skipping blank parts.
    pub fn display_location(&self) -> String {
        [self.name.trim(), self.state.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
