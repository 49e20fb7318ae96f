use citycast_core::{
    Settings, WeatherReading,
    format::{PLACEHOLDER, format_measure, icon_url, observed_at_with, temperature_with},
};

pub const UNAVAILABLE_BANNER: &str = "The site is currently unavailable. Please try again later.";

/// "London (GB)", "Springfield, Illinois (ILLINOIS / US)", or just the name.
fn location_line(reading: &WeatherReading) -> String {
    let location = reading.display_location();
    let state = reading.state.trim();
    let country = reading.country.trim();

    match (state.is_empty(), country.is_empty()) {
        (false, false) => format!("{location} ({} / {country})", state.to_uppercase()),
        (false, true) => format!("{location} ({})", state.to_uppercase()),
        (true, false) => format!("{location} ({country})"),
        (true, true) => location,
    }
}

pub fn weather_card(reading: &WeatherReading, settings: &Settings) -> String {
    let condition = reading
        .condition
        .description
        .as_deref()
        .unwrap_or(PLACEHOLDER);

    let rows = [
        ("Feels like", temperature_with(settings, reading.feels_like)),
        ("Low", temperature_with(settings, reading.temp_min)),
        ("High", temperature_with(settings, reading.temp_max)),
        ("Humidity", format_measure(reading.humidity, "%")),
        ("Wind speed", format_measure(reading.wind_speed, " m/s")),
        ("Condition", condition.to_string()),
        ("Icon", icon_url(&reading.icon)),
    ];

    let mut lines = vec![
        location_line(reading),
        observed_at_with(settings, reading.timestamp, reading.timezone_offset),
        String::new(),
        format!("  {}", temperature_with(settings, reading.temperature)),
        String::new(),
    ];
    lines.extend(rows.iter().map(|(label, value)| format!("  {label:<11} {value}")));

    lines.join("\n")
}

pub fn settings_summary(settings: &Settings) -> String {
    [
        format!("unit              {}", settings.unit),
        format!("time format       {}", settings.time_format),
        format!("decimal precision {}", settings.decimal_precision),
        format!(
            "suggestions       {}",
            if settings.show_suggestions { "on" } else { "off" }
        ),
    ]
    .join("\n")
}
