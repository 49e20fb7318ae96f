use std::{sync::Arc, time::Duration};

use anyhow::{Context, bail};
use citycast_core::{
    Config, ConfiguredLocation, Coordinates, FetchOutcome, FileStore, SettingsPatch,
    SettingsStore, SuggestionState, TemperatureUnit, TimeFormat, WeatherClient, WeatherSession,
    provider_from_config,
};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password};

use crate::render;

/// Upper bound on one suggestion cycle, debounce included.
const SUGGEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "citycast", version, about = "City weather lookup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and home location.
    Configure,

    /// Show current weather for a city, or for your location when no city is given.
    Show {
        /// City name, e.g. "New York" or "Saint-Louis".
        city: Option<String>,

        /// Latitude to use instead of the configured home location.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude to use instead of the configured home location.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },

    /// Suggest city names matching partial input.
    Suggest {
        /// Partial city name as typed.
        text: String,

        /// Show suggestions even when they are turned off in settings.
        #[arg(long)]
        force: bool,
    },

    /// Inspect or change display preferences.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum SettingsAction {
    /// Print the current preferences.
    Show,

    /// Change one or more preferences.
    Set {
        /// celsius, fahrenheit or kelvin.
        #[arg(long)]
        unit: Option<String>,

        /// 12h or 24h.
        #[arg(long)]
        time_format: Option<String>,

        /// Decimal places for temperatures; clamped to 0..=3.
        #[arg(long, allow_negative_numbers = true)]
        precision: Option<i64>,

        /// Whether city suggestions are shown.
        #[arg(long)]
        suggestions: Option<bool>,
    },

    /// Restore the defaults.
    Reset,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, lat, lon } => {
                let position = lat.zip(lon).map(|(latitude, longitude)| Coordinates {
                    latitude,
                    longitude,
                });
                show(city, position).await
            }
            Command::Suggest { text, force } => suggest(&text, force).await,
            Command::Settings { action } => settings(action),
        }
    }
}

fn open_settings() -> anyhow::Result<SettingsStore<FileStore>> {
    SettingsStore::load(FileStore::new(Config::settings_dir()?))
}

fn open_session(config: &Config, position: Option<Coordinates>) -> anyhow::Result<WeatherSession> {
    let provider = provider_from_config(config)?;
    let client = WeatherClient::new(provider).with_suggestion_limit(config.suggestion_limit);
    let geolocator = ConfiguredLocation::new(position.or(config.home));

    Ok(WeatherSession::new(client, Arc::new(geolocator)).with_debounce(config.debounce()))
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key.trim().to_string());
    }

    let set_home = Confirm::new("Set a home location for lookups without a city?")
        .with_default(config.home.is_some())
        .prompt()
        .context("Failed to read answer")?;

    if set_home {
        let latitude = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a decimal number, e.g. 51.5")
            .prompt()
            .context("Failed to read latitude")?;
        let longitude = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a decimal number, e.g. -0.12")
            .prompt()
            .context("Failed to read longitude")?;

        config.home = Some(Coordinates {
            latitude,
            longitude,
        });
    } else {
        config.home = None;
    }

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

async fn show(city: Option<String>, position: Option<Coordinates>) -> anyhow::Result<()> {
    let config = Config::load()?;
    let settings = *open_settings()?.settings();
    let session = open_session(&config, position)?;

    let outcome = match city.as_deref() {
        Some(city) => session.submit(Some(city)).await,
        None => session.start().await,
    };

    match outcome {
        FetchOutcome::Updated => {
            if let Some(reading) = session.reading() {
                println!("{}", render::weather_card(&reading, &settings));
            }
        }
        FetchOutcome::NoData => {
            println!("No weather data for '{}'.", city.unwrap_or_default().trim());
        }
        FetchOutcome::Blocked | FetchOutcome::Unavailable => {
            println!("{}", render::UNAVAILABLE_BANNER);
        }
        // Invalid names are dropped without a message.
        FetchOutcome::Rejected | FetchOutcome::Superseded => {}
    }

    Ok(())
}

async fn suggest(text: &str, force: bool) -> anyhow::Result<()> {
    let settings = *open_settings()?.settings();
    if !settings.show_suggestions && !force {
        println!(
            "Suggestions are turned off. Enable them with \
             `citycast settings set --suggestions true`, or pass --force."
        );
        return Ok(());
    }

    let config = Config::load()?;
    let session = open_session(&config, None)?;
    let mut updates = session.subscribe_suggestions();

    session.type_input(text);

    let suggestions = tokio::time::timeout(SUGGEST_TIMEOUT, async {
        loop {
            let state = updates.borrow_and_update().clone();
            if matches!(state, SuggestionState::Settled(_) | SuggestionState::Idle) {
                return Ok::<_, anyhow::Error>(state.suggestions().to_vec());
            }
            updates
                .changed()
                .await
                .context("Suggestion engine stopped unexpectedly")?;
        }
    })
    .await
    .context("Timed out waiting for suggestions")??;

    if suggestions.is_empty() {
        println!("No suggestions.");
    }
    for suggestion in suggestions {
        println!("{suggestion}");
    }

    Ok(())
}

fn settings(action: SettingsAction) -> anyhow::Result<()> {
    let mut store = open_settings()?;

    match action {
        SettingsAction::Show => {}
        SettingsAction::Set {
            unit,
            time_format,
            precision,
            suggestions,
        } => {
            let patch = SettingsPatch {
                unit: unit.as_deref().map(TemperatureUnit::try_from).transpose()?,
                time_format: time_format.as_deref().map(TimeFormat::try_from).transpose()?,
                decimal_precision: precision,
                show_suggestions: suggestions,
            };
            if patch.is_empty() {
                bail!("Nothing to change. See `citycast settings set --help`.");
            }
            store.update(patch)?;
        }
        SettingsAction::Reset => {
            store.reset()?;
        }
    }

    println!("{}", render::settings_summary(store.settings()));
    Ok(())
}
