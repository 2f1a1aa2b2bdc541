use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value, json};
use wxsnap_core::WeatherSnapshot;

pub const DEFAULT_PERIODS: usize = 24;

fn clock(t: &DateTime<FixedOffset>) -> String {
    t.format("%-I:%M%p").to_string()
}

/// Five-line human summary of a snapshot.
pub fn text_report(snapshot: &WeatherSnapshot, periods: usize) -> String {
    let location = snapshot.location();
    let current = snapshot.current();
    let forecast = snapshot.forecast();
    let sun = snapshot.sun_times();

    let description = current
        .description
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(str::to_lowercase)
        .unwrap_or_else(|| "no description".to_string());

    let outlook = match forecast.temperature_range(periods) {
        Some((lo, hi)) => format!("next {periods}h: {lo} to {hi}"),
        None => "no forecast periods".to_string(),
    };

    let daylight = match (sun.sunrise, sun.sunset) {
        (Some(rise), Some(set)) => format!("Daytime {} to {}", clock(&rise), clock(&set)),
        _ => "Daytime: no sunrise/sunset today".to_string(),
    };

    [
        format!(
            "Weather for {} ({}) - {}",
            location.city,
            location.postal_code,
            snapshot.fetched_at().format("%a %-I:%M%p")
        ),
        format!("Now: {}, {}, {}", current.temperature, description, outlook),
        format!(
            "Humidity: {}, visibility: {}",
            current.relative_humidity, current.visibility
        ),
        daylight,
        forecast.immediate.clone(),
    ]
    .join("\n")
}

/// The text report plus every reported current reading, flattened.
pub fn json_report(snapshot: &WeatherSnapshot, text: &str) -> Value {
    let current = snapshot.current();

    let mut map = Map::new();
    map.insert("text".to_string(), json!(text));
    map.insert("timestamp".to_string(), json!(current.timestamp.to_rfc3339()));
    if let Some(desc) = &current.description {
        map.insert("desc".to_string(), json!(desc));
    }
    if let Some(raw) = &current.raw_message {
        map.insert("raw_message".to_string(), json!(raw));
    }
    for (name, magnitude) in current.summary_fields() {
        map.insert(name.to_string(), json!(magnitude));
    }

    Value::Object(map)
}
