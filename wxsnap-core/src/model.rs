use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use crate::units::{MeasuredValue, Reading};

/// METAR sky cover category. Passed through unconverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CloudCoverage {
    Skc,
    Clr,
    Few,
    Sct,
    Bkn,
    Ovc,
    Vv,
}

impl fmt::Display for CloudCoverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CloudCoverage::Skc => "sky clear",
            CloudCoverage::Clr => "clear",
            CloudCoverage::Few => "few",
            CloudCoverage::Sct => "scattered",
            CloudCoverage::Bkn => "broken",
            CloudCoverage::Ovc => "overcast",
            CloudCoverage::Vv => "vertical visibility",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudLayer {
    pub base: Reading,
    pub amount: CloudCoverage,
}

/// Latest observation at the nearest station, normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub timestamp: DateTime<FixedOffset>,
    pub description: Option<String>,
    pub raw_message: Option<String>,
    pub temperature: Reading,
    pub dewpoint: Reading,
    pub relative_humidity: Reading,
    pub wind_direction: Reading,
    pub wind_speed: Reading,
    pub wind_gust: Reading,
    pub barometric_pressure: Reading,
    pub sea_level_pressure: Reading,
    pub visibility: Reading,
    pub max_temperature_last_24_hours: Reading,
    pub min_temperature_last_24_hours: Reading,
    pub precipitation_last_hour: Reading,
    pub precipitation_last_3_hours: Reading,
    pub precipitation_last_6_hours: Reading,
    pub wind_chill: Reading,
    pub heat_index: Reading,
    pub elevation: Reading,
    pub cloud_layers: Vec<CloudLayer>,
}

impl CurrentConditions {
    /// Every measured field by name.
    pub fn readings(&self) -> [(&'static str, &Reading); 17] {
        [
            ("temperature", &self.temperature),
            ("dewpoint", &self.dewpoint),
            ("relative_humidity", &self.relative_humidity),
            ("wind_direction", &self.wind_direction),
            ("wind_speed", &self.wind_speed),
            ("wind_gust", &self.wind_gust),
            ("barometric_pressure", &self.barometric_pressure),
            ("sea_level_pressure", &self.sea_level_pressure),
            ("visibility", &self.visibility),
            ("max_temperature_last_24_hours", &self.max_temperature_last_24_hours),
            ("min_temperature_last_24_hours", &self.min_temperature_last_24_hours),
            ("precipitation_last_hour", &self.precipitation_last_hour),
            ("precipitation_last_3_hours", &self.precipitation_last_3_hours),
            ("precipitation_last_6_hours", &self.precipitation_last_6_hours),
            ("wind_chill", &self.wind_chill),
            ("heat_index", &self.heat_index),
            ("elevation", &self.elevation),
        ]
    }

    /// Flat name -> magnitude map of the readings that carry data.
    ///
    /// Station elevation and cloud layers are left out.
    pub fn summary_fields(&self) -> BTreeMap<&'static str, f64> {
        self.readings()
            .into_iter()
            .filter(|(name, _)| *name != "elevation")
            .filter_map(|(name, reading)| reading.magnitude().map(|m| (name, m)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPeriod {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub is_daytime: bool,
    pub description: String,
    pub temperature: MeasuredValue,
    pub wind_speed: Reading,
    /// Compass direction as reported, e.g. `"NW"`.
    pub wind_direction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub elevation: Reading,
    pub generated_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
    /// Chronological, in the order the service returned them.
    pub periods: Vec<ForecastPeriod>,
    /// First daily period, as `"{name}: {detailed forecast}"`.
    pub immediate: String,
}

impl Forecast {
    /// Lowest and highest temperature over the first `count` periods.
    pub fn temperature_range(&self, count: usize) -> Option<(MeasuredValue, MeasuredValue)> {
        let mut temps = self.periods.iter().take(count).map(|p| p.temperature);
        let first = temps.next()?;

        Some(temps.fold((first, first), |(lo, hi), t| {
            (
                if t.magnitude < lo.magnitude { t } else { lo },
                if t.magnitude > hi.magnitude { t } else { hi },
            )
        }))
    }
}

/// Local sunrise and sunset. `None` during polar day or night.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunTimes {
    pub sunrise: Option<DateTime<FixedOffset>>,
    pub sunset: Option<DateTime<FixedOffset>>,
}

/// Observation station nearest to the requested point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Station {
    /// Resource URL of the station.
    pub id: String,
    /// Short call sign, e.g. `KSJC`.
    pub identifier: String,
    pub name: String,
}

/// Forecast grid cell the coordinates fall in, as reported by the points lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GridPoint {
    /// Forecast office, e.g. `MTR`.
    pub grid_id: Option<String>,
    pub grid_x: Option<i64>,
    pub grid_y: Option<i64>,
    pub time_zone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::DisplayUnit;

    fn at(hour: u32) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(&format!("2024-05-01T{hour:02}:00:00-07:00")).unwrap()
    }

    fn period(hour: u32, temp: f64) -> ForecastPeriod {
        ForecastPeriod {
            start_time: at(hour),
            end_time: at(hour + 1),
            is_daytime: true,
            description: "Sunny".to_string(),
            temperature: MeasuredValue {
                magnitude: temp,
                unit: DisplayUnit::Celsius,
            },
            wind_speed: Reading::NoData,
            wind_direction: "NW".to_string(),
        }
    }

    fn forecast(temps: &[f64]) -> Forecast {
        Forecast {
            elevation: Reading::NoData,
            generated_at: at(0),
            updated_at: at(0),
            periods: temps
                .iter()
                .enumerate()
                .map(|(i, t)| period(i as u32, *t))
                .collect(),
            immediate: String::new(),
        }
    }

    #[test]
    fn temperature_range_over_leading_periods() {
        let f = forecast(&[14.0, 18.5, 11.0, 25.0]);
        let (lo, hi) = f.temperature_range(3).unwrap();
        assert_eq!(lo.magnitude, 11.0);
        assert_eq!(hi.magnitude, 18.5);
    }

    #[test]
    fn temperature_range_of_empty_forecast_is_none() {
        assert!(forecast(&[]).temperature_range(24).is_none());
    }

    #[test]
    fn cloud_coverage_uses_metar_codes() {
        let c: CloudCoverage = serde_json::from_str("\"BKN\"").unwrap();
        assert_eq!(c, CloudCoverage::Bkn);
        assert_eq!(c.to_string(), "broken");
    }
}
