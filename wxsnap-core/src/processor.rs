//! Turn raw gateway payloads into normalized domain records.
//!
//! Every unit-tagged field goes through [`UnitConverter`] and every timestamp
//! is shifted into the location's time zone. Neither processor holds state
//! beyond its inputs.

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;

use crate::{
    error::ConversionError,
    gateway::payload::{QuantitativeValue, RawForecast, RawObservation, RawPeriod},
    model::{CloudLayer, CurrentConditions, Forecast, ForecastPeriod},
    units::{Reading, UnitConverter, UnitSystem},
};

fn local_time(timestamp: DateTime<FixedOffset>, tz: Tz) -> DateTime<FixedOffset> {
    timestamp.with_timezone(&tz).fixed_offset()
}

fn reading(
    converter: &UnitConverter,
    quantity: Option<&QuantitativeValue>,
    system: UnitSystem,
) -> Result<Reading, ConversionError> {
    match quantity {
        Some(q) => converter.convert(q.value, &q.unit_code, system),
        None => Ok(Reading::NoData),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CurrentConditionsProcessor<'a> {
    converter: &'a UnitConverter,
    system: UnitSystem,
    tz: Tz,
}

impl<'a> CurrentConditionsProcessor<'a> {
    pub fn new(converter: &'a UnitConverter, system: UnitSystem, tz: Tz) -> Self {
        Self {
            converter,
            system,
            tz,
        }
    }

    pub fn process(&self, raw: &RawObservation) -> Result<CurrentConditions, ConversionError> {
        let r = |q: &Option<QuantitativeValue>| reading(self.converter, q.as_ref(), self.system);

        let cloud_layers = raw
            .cloud_layers
            .iter()
            .map(|layer| {
                Ok(CloudLayer {
                    base: reading(self.converter, Some(&layer.base), self.system)?,
                    amount: layer.amount,
                })
            })
            .collect::<Result<Vec<_>, ConversionError>>()?;

        Ok(CurrentConditions {
            timestamp: local_time(raw.timestamp, self.tz),
            description: raw.text_description.clone(),
            raw_message: raw.raw_message.clone(),
            temperature: r(&raw.temperature)?,
            dewpoint: r(&raw.dewpoint)?,
            relative_humidity: r(&raw.relative_humidity)?,
            wind_direction: r(&raw.wind_direction)?,
            wind_speed: r(&raw.wind_speed)?,
            wind_gust: r(&raw.wind_gust)?,
            barometric_pressure: r(&raw.barometric_pressure)?,
            sea_level_pressure: r(&raw.sea_level_pressure)?,
            visibility: r(&raw.visibility)?,
            max_temperature_last_24_hours: r(&raw.max_temperature_last_24_hours)?,
            min_temperature_last_24_hours: r(&raw.min_temperature_last_24_hours)?,
            precipitation_last_hour: r(&raw.precipitation_last_hour)?,
            precipitation_last_3_hours: r(&raw.precipitation_last_3_hours)?,
            precipitation_last_6_hours: r(&raw.precipitation_last_6_hours)?,
            wind_chill: r(&raw.wind_chill)?,
            heat_index: r(&raw.heat_index)?,
            elevation: r(&raw.elevation)?,
            cloud_layers,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ForecastProcessor<'a> {
    converter: &'a UnitConverter,
    system: UnitSystem,
    tz: Tz,
}

impl<'a> ForecastProcessor<'a> {
    pub fn new(converter: &'a UnitConverter, system: UnitSystem, tz: Tz) -> Self {
        Self {
            converter,
            system,
            tz,
        }
    }

    /// Build the forecast from the hourly periods; the first daily period
    /// supplies the short summary.
    pub fn process(
        &self,
        hourly: &RawForecast,
        daily: &RawForecast,
    ) -> Result<Forecast, ConversionError> {
        let periods = hourly
            .periods
            .iter()
            .map(|p| self.period(p))
            .collect::<Result<Vec<_>, _>>()?;

        let immediate = daily
            .periods
            .first()
            .map(|p| format!("{}: {}", p.name, p.detailed_forecast))
            .unwrap_or_default();

        Ok(Forecast {
            elevation: reading(self.converter, Some(&hourly.elevation), self.system)?,
            generated_at: local_time(hourly.generated_at, self.tz),
            updated_at: local_time(hourly.update_time, self.tz),
            periods,
            immediate,
        })
    }

    fn period(&self, raw: &RawPeriod) -> Result<ForecastPeriod, ConversionError> {
        let temperature_code = match raw.temperature_unit.as_str() {
            "C" => "degC",
            "F" => "degF",
            other => return Err(ConversionError::UnknownUnit(other.to_string())),
        };

        Ok(ForecastPeriod {
            start_time: local_time(raw.start_time, self.tz),
            end_time: local_time(raw.end_time, self.tz),
            is_daytime: raw.is_daytime,
            description: raw.short_forecast.clone(),
            temperature: self
                .converter
                .convert_value(raw.temperature, temperature_code, self.system)?,
            wind_speed: self
                .converter
                .convert_expression(&raw.wind_speed, self.system)?,
            wind_direction: raw.wind_direction.clone(),
        })
    }
}
