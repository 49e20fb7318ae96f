//! Debounced city suggestions.
//!
//! Each keystroke restarts a cycle: wait for a quiet period, search the
//! geocoder, drop case-insensitive duplicates and entries that do not contain
//! the typed text, then confirm candidates one at a time with a real weather
//! lookup until [`MAX_SUGGESTIONS`] are confirmed. Only one cycle is live per
//! engine; a superseded cycle never publishes.

use std::{collections::HashSet, sync::Arc, time::Duration};

use parking_lot::Mutex;
use tokio::{sync::watch, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{client::WeatherClient, status::ServiceStatus};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);
pub const MAX_SUGGESTIONS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SuggestionState {
    /// No input.
    #[default]
    Idle,
    /// Waiting for typing to pause.
    Debouncing,
    /// Geocoding search in flight.
    Searching,
    /// Confirming candidates one by one.
    Validating,
    /// Final list for the current input, possibly empty.
    Settled(Vec<String>),
}

impl SuggestionState {
    pub fn suggestions(&self) -> &[String] {
        match self {
            SuggestionState::Settled(list) => list,
            _ => &[],
        }
    }
}

/// Drop case-insensitive duplicates (first occurrence wins), then keep the
/// entries containing `query`, ignoring case. Order is preserved.
pub fn filter_candidates(raw: Vec<String>, query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    let mut seen = HashSet::new();

    raw.into_iter()
        .filter(|candidate| seen.insert(candidate.to_lowercase()))
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug)]
pub struct SuggestionEngine {
    client: WeatherClient,
    status: ServiceStatus,
    debounce: Duration,
    pending: Mutex<Option<CancellationToken>>,
    state: Arc<watch::Sender<SuggestionState>>,
}

impl SuggestionEngine {
    pub fn new(client: WeatherClient, status: ServiceStatus) -> Self {
        let (state, _) = watch::channel(SuggestionState::Idle);
        Self {
            client,
            status,
            debounce: DEFAULT_DEBOUNCE,
            pending: Mutex::new(None),
            state: Arc::new(state),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<SuggestionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SuggestionState {
        self.state.borrow().clone()
    }

    /// Feed the current input text. Cancels any live cycle and, unless the
    /// input is blank or the service is unavailable, schedules a new one.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn on_input(&self, text: &str) {
        let mut pending = self.pending.lock();
        if let Some(previous) = pending.take() {
            previous.cancel();
        }

        let query = text.trim();
        if query.is_empty() {
            self.state.send_replace(SuggestionState::Idle);
            return;
        }

        if self.status.is_unavailable() {
            self.state.send_replace(SuggestionState::Settled(Vec::new()));
            return;
        }

        let token = CancellationToken::new();
        *pending = Some(token.clone());
        self.state.send_replace(SuggestionState::Debouncing);

        let cycle = Cycle {
            client: self.client.clone(),
            status: self.status.clone(),
            query: query.to_string(),
            deadline: Instant::now() + self.debounce,
            token,
            state: Arc::clone(&self.state),
        };
        tokio::spawn(cycle.run());
    }

    /// Cancel any live cycle and discard the list.
    pub fn clear(&self) {
        if let Some(previous) = self.pending.lock().take() {
            previous.cancel();
        }
        self.state.send_replace(SuggestionState::Idle);
    }
}

impl Drop for SuggestionEngine {
    fn drop(&mut self) {
        if let Some(token) = self.pending.get_mut().take() {
            token.cancel();
        }
    }
}

struct Cycle {
    client: WeatherClient,
    status: ServiceStatus,
    query: String,
    deadline: Instant,
    token: CancellationToken,
    state: Arc<watch::Sender<SuggestionState>>,
}

impl Cycle {
    async fn run(self) {
        tokio::select! {
            _ = self.token.cancelled() => return,
            _ = tokio::time::sleep_until(self.deadline) => {}
        }

        // The flag may have been raised while this cycle was waiting.
        if self.status.is_unavailable() {
            debug!(query = %self.query, "Service unavailable, skipping search");
            self.publish(SuggestionState::Settled(Vec::new()));
            return;
        }

        self.publish(SuggestionState::Searching);
        let labels = tokio::select! {
            _ = self.token.cancelled() => return,
            labels = self.client.search_city_suggestions(&self.query) => labels,
        };
        if labels.is_empty() {
            self.publish(SuggestionState::Settled(Vec::new()));
            return;
        }

        self.publish(SuggestionState::Validating);
        let mut confirmed = Vec::new();
        for candidate in filter_candidates(labels, &self.query) {
            if confirmed.len() >= MAX_SUGGESTIONS {
                break;
            }

            let valid = tokio::select! {
                _ = self.token.cancelled() => return,
                valid = self.client.validate_city_weather(&candidate) => valid,
            };
            if valid {
                confirmed.push(candidate);
            }
        }

        debug!(query = %self.query, count = confirmed.len(), "Suggestions settled");
        self.publish(SuggestionState::Settled(confirmed));
    }

    /// Publish unless this cycle has been superseded. The check runs under the
    /// channel's lock, so a cancel followed by the new cycle's first publish
    /// can never be overwritten by this one.
    fn publish(&self, next: SuggestionState) {
        self.state.send_if_modified(|current| {
            if self.token.is_cancelled() {
                return false;
            }
            *current = next;
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeProvider;

    fn engine_for(provider: Arc<FakeProvider>) -> (SuggestionEngine, ServiceStatus) {
        let status = ServiceStatus::new();
        let engine = SuggestionEngine::new(WeatherClient::new(provider), status.clone());
        (engine, status)
    }

    async fn settled(rx: &mut watch::Receiver<SuggestionState>) -> Vec<String> {
        loop {
            if let SuggestionState::Settled(list) = &*rx.borrow_and_update() {
                return list.clone();
            }
            rx.changed().await.unwrap();
        }
    }

    #[test]
    fn duplicates_collapse_before_filtering() {
        let raw = vec!["Paris".to_string(), "paris".to_string(), "Paris, FR".to_string()];
        assert_eq!(filter_candidates(raw, "par"), vec!["Paris", "Paris, FR"]);
    }

    #[test]
    fn filter_is_case_insensitive_substring() {
        let raw = vec![
            "Londonderry".to_string(),
            "New London".to_string(),
            "Lyon".to_string(),
        ];
        assert_eq!(filter_candidates(raw, " LON "), vec!["Londonderry", "New London"]);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_quiet_period_and_keeps_order() {
        let provider = FakeProvider::new()
            .with_suggestions(["London", "London City"])
            .with_cities(["London", "London City"])
            .shared();
        let (engine, _) = engine_for(provider.clone());
        let mut rx = engine.subscribe();

        engine.on_input("Lon");
        tokio::time::advance(Duration::from_millis(200)).await;
        assert_eq!(engine.state(), SuggestionState::Debouncing);
        assert!(provider.searches().is_empty());

        assert_eq!(settled(&mut rx).await, vec!["London", "London City"]);
        assert_eq!(provider.searches(), vec!["Lon"]);
    }

    #[tokio::test(start_paused = true)]
    async fn keystrokes_within_window_restart_the_cycle() {
        let provider = FakeProvider::new()
            .with_suggestions(["London"])
            .with_city("London")
            .shared();
        let (engine, _) = engine_for(provider.clone());
        let mut rx = engine.subscribe();

        engine.on_input("L");
        tokio::time::advance(Duration::from_millis(100)).await;
        engine.on_input("Lo");
        tokio::time::advance(Duration::from_millis(100)).await;
        engine.on_input("Lon");

        assert_eq!(settled(&mut rx).await, vec!["London"]);
        assert_eq!(provider.searches(), vec!["Lon"]);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_after_three_confirmed() {
        let names = [
            "London",
            "London City",
            "London Bridge",
            "Londonderry",
            "London Colney",
        ];
        let provider = FakeProvider::new()
            .with_suggestions(names)
            .with_cities(names)
            .shared();
        let (engine, _) = engine_for(provider.clone());
        let mut rx = engine.subscribe();

        engine.on_input("london");

        assert_eq!(
            settled(&mut rx).await,
            vec!["London", "London City", "London Bridge"]
        );
        assert_eq!(provider.lookups().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_and_unrelated_candidates_are_dropped() {
        let provider = FakeProvider::new()
            .with_suggestions(["Londres", "Paris", "London", "london"])
            .with_cities(["London", "Paris"])
            .shared();
        let (engine, _) = engine_for(provider.clone());
        let mut rx = engine.subscribe();

        engine.on_input("Lon");

        assert_eq!(settled(&mut rx).await, vec!["London"]);
        // "Paris" is filtered out and "london" deduplicated before validation.
        assert_eq!(provider.lookups(), vec!["London"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unavailable_service_short_circuits() {
        let provider = FakeProvider::new().with_suggestions(["London"]).shared();
        let (engine, status) = engine_for(provider.clone());
        status.mark_unavailable();

        engine.on_input("Lon");
        assert_eq!(engine.state(), SuggestionState::Settled(Vec::new()));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(provider.searches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn flag_raised_during_debounce_skips_search() {
        let provider = FakeProvider::new()
            .with_suggestions(["London"])
            .with_city("London")
            .shared();
        let (engine, status) = engine_for(provider.clone());
        let mut rx = engine.subscribe();

        engine.on_input("Lon");
        assert_eq!(engine.state(), SuggestionState::Debouncing);
        status.mark_unavailable();

        assert!(settled(&mut rx).await.is_empty());
        assert!(provider.searches().is_empty());
        assert!(provider.lookups().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_search_settles_empty() {
        let provider = FakeProvider::new().failing_search().shared();
        let (engine, _) = engine_for(provider);
        let mut rx = engine.subscribe();

        engine.on_input("Lon");
        assert!(settled(&mut rx).await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_goes_idle() {
        let provider = FakeProvider::new().shared();
        let (engine, _) = engine_for(provider.clone());

        engine.on_input("   ");
        assert_eq!(engine.state(), SuggestionState::Idle);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(provider.searches().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cleared_cycle_never_publishes() {
        let provider = FakeProvider::new()
            .with_suggestions(["London"])
            .with_slow_city("London", Duration::from_secs(2))
            .shared();
        let (engine, _) = engine_for(provider.clone());
        let mut rx = engine.subscribe();

        engine.on_input("Lon");
        while *rx.borrow_and_update() != SuggestionState::Validating {
            rx.changed().await.unwrap();
        }

        engine.clear();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(engine.state(), SuggestionState::Idle);
        assert_eq!(provider.lookups(), vec!["London"]);
    }
}
