//! Fetch orchestration for one search box.
//!
//! A [`WeatherSession`] owns the displayed reading, the input text, the
//! suggestion engine and the "service unavailable" flag. Fetches are
//! last-write-wins: starting one cancels the previous, and a response that
//! arrives after its fetch was superseded is dropped.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    client::WeatherClient,
    location::Geolocator,
    model::WeatherReading,
    status::ServiceStatus,
    suggest::{SuggestionEngine, SuggestionState},
};

pub const MIN_CITY_NAME_LEN: usize = 2;
pub const MAX_CITY_NAME_LEN: usize = 30;

/// What became of a fetch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A new reading is on display.
    Updated,
    /// The provider had nothing; the display is unchanged.
    NoData,
    /// The city name failed validation; nothing was sent.
    Rejected,
    /// Search is disabled while the service is unavailable.
    Blocked,
    /// A newer fetch started before this one finished.
    Superseded,
    /// Geolocation or the coordinates lookup failed; the service is now
    /// flagged unavailable.
    Unavailable,
}

/// Trimmed length within 2..=30, letters, whitespace and hyphens only.
pub fn is_valid_city_name(name: &str) -> bool {
    let cleaned = name.trim();
    let len = cleaned.chars().count();

    (MIN_CITY_NAME_LEN..=MAX_CITY_NAME_LEN).contains(&len)
        && cleaned
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-')
}

#[derive(Debug)]
pub struct WeatherSession {
    client: WeatherClient,
    geolocator: Arc<dyn Geolocator>,
    status: ServiceStatus,
    suggestions: SuggestionEngine,
    inflight: Mutex<Option<CancellationToken>>,
    input: Mutex<String>,
    city: Mutex<Option<String>>,
    reading: watch::Sender<Option<WeatherReading>>,
}

impl WeatherSession {
    pub fn new(client: WeatherClient, geolocator: Arc<dyn Geolocator>) -> Self {
        let status = ServiceStatus::new();
        let suggestions = SuggestionEngine::new(client.clone(), status.clone());
        let (reading, _) = watch::channel(None);

        Self {
            client,
            geolocator,
            status,
            suggestions,
            inflight: Mutex::new(None),
            input: Mutex::new(String::new()),
            city: Mutex::new(None),
            reading,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.suggestions = self.suggestions.with_debounce(debounce);
        self
    }

    pub fn status(&self) -> &ServiceStatus {
        &self.status
    }

    pub fn is_unavailable(&self) -> bool {
        self.status.is_unavailable()
    }

    pub fn reading(&self) -> Option<WeatherReading> {
        self.reading.borrow().clone()
    }

    pub fn subscribe_reading(&self) -> watch::Receiver<Option<WeatherReading>> {
        self.reading.subscribe()
    }

    pub fn suggestions(&self) -> SuggestionState {
        self.suggestions.state()
    }

    pub fn subscribe_suggestions(&self) -> watch::Receiver<SuggestionState> {
        self.suggestions.subscribe()
    }

    pub fn input(&self) -> String {
        self.input.lock().clone()
    }

    pub fn selected_city(&self) -> Option<String> {
        self.city.lock().clone()
    }

    /// Replace the input text and restart the suggestion cycle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn type_input(&self, text: &str) {
        *self.input.lock() = text.to_string();
        self.suggestions.on_input(text);
    }

    /// Look up a city, or the current input text when `city` is `None`.
    pub async fn submit(&self, city: Option<&str>) -> FetchOutcome {
        if self.status.is_unavailable() {
            return FetchOutcome::Blocked;
        }

        let name = match city {
            Some(city) => city.trim().to_string(),
            None => self.input.lock().trim().to_string(),
        };
        if !is_valid_city_name(&name) {
            debug!(%name, "Dropping invalid city name");
            return FetchOutcome::Rejected;
        }

        let token = self.begin_fetch();
        let result = tokio::select! {
            _ = token.cancelled() => return FetchOutcome::Superseded,
            result = self.client.get_weather_by_city(&name) => result,
        };

        match result {
            Some(reading) => self.commit(&token, reading, Some(name)),
            None if token.is_cancelled() => FetchOutcome::Superseded,
            None => {
                self.finish(&token);
                FetchOutcome::NoData
            }
        }
    }

    /// Look up the weather at the geolocator's position.
    ///
    /// Allowed while the service is unavailable: a successful read here is
    /// what clears the flag.
    pub async fn locate(&self) -> FetchOutcome {
        let token = self.begin_fetch();

        let position = tokio::select! {
            _ = token.cancelled() => return FetchOutcome::Superseded,
            position = self.geolocator.current_position() => position,
        };
        let at = match position {
            Ok(at) => at,
            Err(err) => {
                warn!("Geolocation failed: {err}");
                return self.fail(&token);
            }
        };

        let result = tokio::select! {
            _ = token.cancelled() => return FetchOutcome::Superseded,
            result = self.client.get_weather_by_coords(at) => result,
        };

        match result {
            Some(reading) => self.commit(&token, reading, None),
            None => self.fail(&token),
        }
    }

    /// Initial load: refresh the selected city, or locate when there is none.
    pub async fn start(&self) -> FetchOutcome {
        match self.selected_city() {
            Some(city) => self.submit(Some(&city)).await,
            None => self.locate().await,
        }
    }

    fn begin_fetch(&self) -> CancellationToken {
        let mut inflight = self.inflight.lock();
        if let Some(previous) = inflight.take() {
            debug!("Cancelling in-flight fetch");
            previous.cancel();
        }

        let token = CancellationToken::new();
        *inflight = Some(token.clone());
        token
    }

    /// Forget `token` if it is still the live fetch.
    fn finish(&self, token: &CancellationToken) {
        let mut inflight = self.inflight.lock();
        if !token.is_cancelled() {
            *inflight = None;
        }
    }

    fn commit(
        &self,
        token: &CancellationToken,
        reading: WeatherReading,
        city: Option<String>,
    ) -> FetchOutcome {
        // Held across the whole commit so a concurrent fetch cannot start
        // between the cancellation check and the state update.
        let mut inflight = self.inflight.lock();
        if token.is_cancelled() {
            debug!("Discarding superseded reading");
            return FetchOutcome::Superseded;
        }
        *inflight = None;

        info!(location = %reading.display_location(), "Weather updated");
        *self.city.lock() = city;
        self.input.lock().clear();
        self.suggestions.clear();
        self.status.mark_available();
        self.reading.send_replace(Some(reading));

        FetchOutcome::Updated
    }

    fn fail(&self, token: &CancellationToken) -> FetchOutcome {
        let mut inflight = self.inflight.lock();
        if token.is_cancelled() {
            return FetchOutcome::Superseded;
        }
        *inflight = None;

        self.status.mark_unavailable();
        self.suggestions.clear();
        FetchOutcome::Unavailable
    }
}
