//! Display formatting for readings.
//!
//! Every function here is pure and fails soft: values that cannot be
//! rendered come back as [`PLACEHOLDER`] instead of an error.

use chrono::DateTime;

use crate::settings::{Settings, TemperatureUnit, TimeFormat};

/// Rendered in place of a value that is missing or not finite.
pub const PLACEHOLDER: &str = "N/A";

pub const MAX_PRECISION: u8 = 3;

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Clamp a requested number of decimals into `0..=MAX_PRECISION`.
pub fn clamp_precision(precision: i64) -> u8 {
    // Bounded by MAX_PRECISION, so the narrowing cast is lossless.
    precision.clamp(0, i64::from(MAX_PRECISION)) as u8
}

/// Convert a Celsius temperature into `unit` and render it with at most
/// `precision` decimals, e.g. `"32°F"` or `"273.15°K"`.
///
/// Trailing zeros are dropped after rounding, so `20.10` at two decimals
/// renders as `"20.1°C"`.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit, precision: i64) -> String {
    if !celsius.is_finite() {
        return PLACEHOLDER.to_string();
    }

    let value = match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        TemperatureUnit::Kelvin => celsius + 273.15,
    };

    format!("{}{}", round_to(value, clamp_precision(precision)), unit.glyph())
}

/// Render a Unix timestamp in the observed location's local time.
///
/// The offset is applied before formatting in UTC, so the result does not
/// depend on the timezone of the machine doing the rendering.
pub fn format_date_time(timestamp: i64, timezone_offset: i32, use_12_hour: bool) -> String {
    let local = timestamp
        .checked_add(i64::from(timezone_offset))
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    let Some(local) = local else {
        return PLACEHOLDER.to_string();
    };

    let pattern = if use_12_hour {
        "%a %d %b, %I:%M %P"
    } else {
        "%a %d %b, %H:%M"
    };

    local.format(pattern).to_string()
}

/// Temperature rendered with the unit and precision from `settings`.
pub fn temperature_with(settings: &Settings, celsius: f64) -> String {
    format_temperature(
        celsius,
        settings.unit,
        i64::from(settings.decimal_precision),
    )
}

/// Observation time rendered with the time format from `settings`.
///
/// A reading without a timestamp renders the placeholder; a missing offset is
/// treated as UTC.
pub fn observed_at_with(
    settings: &Settings,
    timestamp: Option<i64>,
    timezone_offset: Option<i32>,
) -> String {
    match timestamp {
        Some(ts) => format_date_time(
            ts,
            timezone_offset.unwrap_or(0),
            settings.time_format == TimeFormat::TwelveHour,
        ),
        None => PLACEHOLDER.to_string(),
    }
}

/// A plain measurement followed by its suffix, e.g. `"81%"` or `"4.6 m/s"`.
pub fn format_measure(value: f64, suffix: &str) -> String {
    if value.is_finite() {
        format!("{}{suffix}", round_to(value, 1))
    } else {
        PLACEHOLDER.to_string()
    }
}

/// URL of the provider's large icon for `code`.
pub fn icon_url(code: &str) -> String {
    format!("{ICON_BASE_URL}/{code}@4x.png")
}

/// Digits past the requested precision inspected when looking for an exact
/// tie. A tie at three decimals has a magnitude of at least 0.0005, where
/// neighbouring doubles already differ within this many digits.
const TIE_DIGITS: usize = 40;

/// Round the exact decimal value of `value` to `decimals` places.
///
/// Exact ties round away from zero, so `0.125` becomes `0.13` while `4.35`
/// (stored as 4.3499...) becomes `4.3`.
fn round_to(value: f64, decimals: u8) -> f64 {
    let decimals = usize::from(decimals);
    let magnitude = value.abs();

    let digits = decimals + TIE_DIGITS;
    let expanded = format!("{magnitude:.digits$}");
    let is_tie = expanded.split_once('.').is_some_and(|(_, fraction)| {
        let rest = &fraction[decimals..];
        rest.starts_with('5') && rest[1..].bytes().all(|b| b == b'0')
    });

    // The next double up lies just past the tie, so the formatter's
    // round-half-even cannot pull it back down.
    let magnitude = if is_tie {
        f64::from_bits(magnitude.to_bits() + 1)
    } else {
        magnitude
    };

    let rounded = format!("{magnitude:.decimals$}")
        .parse::<f64>()
        .unwrap_or(magnitude);
    let signed = if value.is_sign_negative() { -rounded } else { rounded };

    // Never print "-0".
    if signed == 0.0 { 0.0 } else { signed }
}
