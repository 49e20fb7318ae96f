//! User preferences and their persistence.
//!
//! Only the fields that differ from [`Settings::default()`] are written, as a
//! JSON object under a single key. When nothing differs the key is removed.

use std::{collections::HashMap, fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::format::clamp_precision;

/// Key under which the settings diff is stored.
pub const SETTINGS_KEY: &str = "app-settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Kelvin => "kelvin",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "°K",
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            "kelvin" | "k" => Ok(TemperatureUnit::Kelvin),
            _ => Err(anyhow::anyhow!(
                "Unknown unit '{value}'. Supported units: celsius, fahrenheit, kelvin."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    #[serde(rename = "12h")]
    TwelveHour,
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHour,
}

impl TimeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "12h",
            TimeFormat::TwentyFourHour => "24h",
        }
    }
}

impl std::fmt::Display for TimeFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TimeFormat {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "12h" | "12" => Ok(TimeFormat::TwelveHour),
            "24h" | "24" => Ok(TimeFormat::TwentyFourHour),
            _ => Err(anyhow::anyhow!(
                "Unknown time format '{value}'. Supported formats: 12h, 24h."
            )),
        }
    }
}

/// Display preferences, passed explicitly to every formatting call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub unit: TemperatureUnit,
    pub time_format: TimeFormat,
    /// Always within `0..=3`.
    pub decimal_precision: u8,
    pub show_suggestions: bool,
}

/// A partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub unit: Option<TemperatureUnit>,
    pub time_format: Option<TimeFormat>,
    /// Clamped into `0..=3` when applied.
    pub decimal_precision: Option<i64>,
    pub show_suggestions: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Settings> for SettingsPatch {
    fn from(settings: Settings) -> Self {
        Self {
            unit: Some(settings.unit),
            time_format: Some(settings.time_format),
            decimal_precision: Some(i64::from(settings.decimal_precision)),
            show_suggestions: Some(settings.show_suggestions),
        }
    }
}

impl Settings {
    pub fn apply(&self, patch: SettingsPatch) -> Settings {
        Settings {
            unit: patch.unit.unwrap_or(self.unit),
            time_format: patch.time_format.unwrap_or(self.time_format),
            decimal_precision: clamp_precision(
                patch
                    .decimal_precision
                    .unwrap_or(i64::from(self.decimal_precision)),
            ),
            show_suggestions: patch.show_suggestions.unwrap_or(self.show_suggestions),
        }
    }

    /// Copy with the precision forced into `0..=3`.
    pub fn clamped(&self) -> Settings {
        Settings {
            decimal_precision: clamp_precision(i64::from(self.decimal_precision)),
            ..*self
        }
    }

    /// Fields whose value differs from the default, keyed by their persisted
    /// name. The precision is clamped first.
    pub fn diff_from_default(&self) -> Result<Map<String, Value>> {
        let current = to_map(&self.clamped())?;
        let defaults = to_map(&Settings::default())?;

        Ok(current
            .into_iter()
            .filter(|(key, value)| defaults.get(key) != Some(value))
            .collect())
    }

    /// Overlay a persisted diff onto the defaults.
    ///
    /// Unknown keys are ignored; an out-of-range precision is clamped.
    pub fn from_persisted(raw: &str) -> Result<Settings> {
        let stored: Map<String, Value> =
            serde_json::from_str(raw).context("Persisted settings are not a JSON object")?;

        let mut merged = to_map(&Settings::default())?;
        for (key, value) in stored {
            if merged.contains_key(&key) {
                merged.insert(key, value);
            }
        }

        // Precision is clamped separately so an out-of-range value does not
        // fail the whole object.
        let precision = merged
            .insert("decimalPrecision".into(), Value::from(0))
            .and_then(|v| v.as_i64());
        let settings: Settings = serde_json::from_value(Value::Object(merged))
            .context("Persisted settings have an unexpected shape")?;

        Ok(settings.apply(SettingsPatch {
            decimal_precision: precision,
            ..SettingsPatch::default()
        }))
    }
}

fn to_map(settings: &Settings) -> Result<Map<String, Value>> {
    match serde_json::to_value(settings).context("Failed to serialize settings")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow::anyhow!("Settings serialized to non-object: {other}")),
    }
}

/// Minimal string key-value storage, the way a browser's local storage is
/// used: whole values are read, replaced or removed.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        Ok(Some(contents))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create settings directory: {}", self.dir.display())
        })?;

        let path = self.path_for(key);
        fs::write(&path, value)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }

        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove settings file: {}", path.display()))
    }
}

/// Volatile store for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Current settings plus the store they are persisted in.
#[derive(Debug)]
pub struct SettingsStore<S> {
    store: S,
    settings: Settings,
}

impl<S: KeyValueStore> SettingsStore<S> {
    /// Read persisted settings merged over the defaults.
    ///
    /// A persisted value that cannot be understood is logged and ignored; a
    /// store that cannot be read is an error.
    pub fn load(store: S) -> Result<Self> {
        let settings = match store.get(SETTINGS_KEY)? {
            Some(raw) => Settings::from_persisted(&raw).unwrap_or_else(|err| {
                tracing::warn!("Ignoring persisted settings: {err:#}");
                Settings::default()
            }),
            None => Settings::default(),
        };

        Ok(Self { store, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply `patch`, persist the non-default fields and return the result.
    pub fn update(&mut self, patch: SettingsPatch) -> Result<Settings> {
        let updated = self.settings.apply(patch);
        let diff = updated.diff_from_default()?;

        if diff.is_empty() {
            self.store.remove(SETTINGS_KEY)?;
            tracing::info!("Settings match defaults; cleared persisted settings");
        } else {
            let json = serde_json::to_string(&diff).context("Failed to encode settings")?;
            self.store.set(SETTINGS_KEY, &json)?;
            tracing::info!(fields = diff.len(), "Persisted settings");
        }

        self.settings = updated;
        Ok(updated)
    }

    pub fn reset(&mut self) -> Result<Settings> {
        self.update(Settings::default().into())
    }
}
