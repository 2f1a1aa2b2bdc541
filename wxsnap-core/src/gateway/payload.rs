//! Response shapes of the api.weather.gov endpoints used by the gateway chain.
//!
//! Only the fields the pipeline consumes are declared; anything else in the
//! JSON is ignored. Missing required fields fail at decode time.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::model::{CloudCoverage, GridPoint};

/// Most endpoints nest their payload under `properties`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub properties: T,
}

/// `points/{lat},{lon}`: URLs of the follow-up resources for a grid cell.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayMeta {
    pub forecast: String,
    pub forecast_hourly: String,
    pub observation_stations: String,
    #[serde(default)]
    pub grid_id: Option<String>,
    #[serde(default)]
    pub grid_x: Option<i64>,
    #[serde(default)]
    pub grid_y: Option<i64>,
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl GatewayMeta {
    pub fn grid_point(&self) -> GridPoint {
        GridPoint {
            grid_id: self.grid_id.clone(),
            grid_x: self.grid_x,
            grid_y: self.grid_y,
            time_zone: self.time_zone.clone(),
        }
    }
}

/// A `{ "unitCode": ..., "value": ... }` pair. `value` is null when unreported.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantitativeValue {
    pub unit_code: String,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawForecast {
    pub elevation: QuantitativeValue,
    pub generated_at: DateTime<FixedOffset>,
    pub update_time: DateTime<FixedOffset>,
    pub periods: Vec<RawPeriod>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPeriod {
    #[serde(default)]
    pub name: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub is_daytime: bool,
    pub temperature: f64,
    #[serde(default = "default_temperature_unit")]
    pub temperature_unit: String,
    #[serde(default)]
    pub wind_speed: String,
    #[serde(default)]
    pub wind_direction: String,
    pub short_forecast: String,
    #[serde(default)]
    pub detailed_forecast: String,
}

fn default_temperature_unit() -> String {
    "C".to_string()
}

/// Observation station listing; the first feature is the nearest station.
#[derive(Debug, Deserialize)]
pub struct StationCollection {
    pub features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
pub struct StationFeature {
    pub id: String,
    pub properties: StationProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationProperties {
    pub station_identifier: String,
    #[serde(default)]
    pub name: String,
}

/// `stations/{id}/observations/latest`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawObservation {
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub text_description: Option<String>,
    #[serde(default)]
    pub raw_message: Option<String>,
    #[serde(default)]
    pub elevation: Option<QuantitativeValue>,
    #[serde(default)]
    pub temperature: Option<QuantitativeValue>,
    #[serde(default)]
    pub dewpoint: Option<QuantitativeValue>,
    #[serde(default)]
    pub wind_direction: Option<QuantitativeValue>,
    #[serde(default)]
    pub wind_speed: Option<QuantitativeValue>,
    #[serde(default)]
    pub wind_gust: Option<QuantitativeValue>,
    #[serde(default)]
    pub barometric_pressure: Option<QuantitativeValue>,
    #[serde(default)]
    pub sea_level_pressure: Option<QuantitativeValue>,
    #[serde(default)]
    pub visibility: Option<QuantitativeValue>,
    #[serde(default)]
    pub max_temperature_last_24_hours: Option<QuantitativeValue>,
    #[serde(default)]
    pub min_temperature_last_24_hours: Option<QuantitativeValue>,
    #[serde(default)]
    pub precipitation_last_hour: Option<QuantitativeValue>,
    #[serde(default)]
    pub precipitation_last_3_hours: Option<QuantitativeValue>,
    #[serde(default)]
    pub precipitation_last_6_hours: Option<QuantitativeValue>,
    #[serde(default)]
    pub relative_humidity: Option<QuantitativeValue>,
    #[serde(default)]
    pub wind_chill: Option<QuantitativeValue>,
    #[serde(default)]
    pub heat_index: Option<QuantitativeValue>,
    #[serde(default)]
    pub cloud_layers: Vec<RawCloudLayer>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCloudLayer {
    pub base: QuantitativeValue,
    pub amount: CloudCoverage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_decodes_sparse_payload() {
        let json = serde_json::json!({
            "properties": {
                "timestamp": "2024-05-01T18:53:00+00:00",
                "textDescription": "Clear",
                "rawMessage": "",
                "temperature": { "unitCode": "wmoUnit:degC", "value": 22.0 },
                "windGust": { "unitCode": "wmoUnit:km_h-1", "value": null },
                "maxTemperatureLast24Hours": { "unitCode": "wmoUnit:degC", "value": null },
                "precipitationLast3Hours": { "unitCode": "wmoUnit:mm" },
                "cloudLayers": [
                    { "base": { "unitCode": "wmoUnit:m", "value": 1500 }, "amount": "FEW" }
                ]
            }
        });

        let obs: Envelope<RawObservation> = serde_json::from_value(json).unwrap();
        let obs = obs.properties;
        assert_eq!(obs.temperature.unwrap().value, Some(22.0));
        assert_eq!(obs.wind_gust.unwrap().value, None);
        assert!(obs.max_temperature_last_24_hours.is_some());
        assert_eq!(obs.precipitation_last_3_hours.unwrap().value, None);
        assert!(obs.dewpoint.is_none());
        assert_eq!(obs.cloud_layers.len(), 1);
        assert_eq!(obs.cloud_layers[0].amount, CloudCoverage::Few);
    }

    #[test]
    fn points_metadata_keeps_grid_cell() {
        let json = serde_json::json!({
            "properties": {
                "gridId": "MTR",
                "gridX": 99,
                "gridY": 60,
                "forecast": "https://api.weather.gov/gridpoints/MTR/99,60/forecast",
                "forecastHourly": "https://api.weather.gov/gridpoints/MTR/99,60/forecast/hourly",
                "observationStations": "https://api.weather.gov/gridpoints/MTR/99,60/stations",
                "timeZone": "America/Los_Angeles"
            }
        });

        let meta: Envelope<GatewayMeta> = serde_json::from_value(json).unwrap();
        let grid = meta.properties.grid_point();
        assert_eq!(grid.grid_id.as_deref(), Some("MTR"));
        assert_eq!((grid.grid_x, grid.grid_y), (Some(99), Some(60)));
        assert_eq!(grid.time_zone.as_deref(), Some("America/Los_Angeles"));
    }

    #[test]
    fn observation_without_timestamp_is_rejected() {
        let json = serde_json::json!({ "properties": { "textDescription": "Clear" } });
        assert!(serde_json::from_value::<Envelope<RawObservation>>(json).is_err());
    }

    #[test]
    fn unknown_cloud_coverage_is_rejected() {
        let json = serde_json::json!({
            "base": { "unitCode": "wmoUnit:m", "value": 100 },
            "amount": "LOTS"
        });
        assert!(serde_json::from_value::<RawCloudLayer>(json).is_err());
    }
}
