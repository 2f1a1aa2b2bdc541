use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    config::Config,
    error::WeatherError,
    gateway::WeatherGateway,
    location::{Location, LocationResolver, ZippopotamResolver},
    model::{CurrentConditions, Forecast, GridPoint, Station, SunTimes},
    processor::{CurrentConditionsProcessor, ForecastProcessor},
    suntime::{SolarSuntime, SuntimeProvider},
    units::{UnitConverter, UnitSystem},
};

/// One complete weather result for a location. Immutable once built; fetch a
/// new one to refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    location: Location,
    units: UnitSystem,
    fetched_at: DateTime<FixedOffset>,
    grid: GridPoint,
    station: Station,
    current: CurrentConditions,
    forecast: Forecast,
    sun_times: SunTimes,
}

impl WeatherSnapshot {
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn units(&self) -> UnitSystem {
        self.units
    }

    /// When the fetch ran, in the location's zone.
    pub fn fetched_at(&self) -> DateTime<FixedOffset> {
        self.fetched_at
    }

    pub fn grid(&self) -> &GridPoint {
        &self.grid
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    pub fn current(&self) -> &CurrentConditions {
        &self.current
    }

    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    pub fn sun_times(&self) -> &SunTimes {
        &self.sun_times
    }
}

/// Collects the sub-results of a fetch. [`SnapshotParts::assemble`] refuses to
/// build a snapshot unless every part is present.
#[derive(Debug, Clone, Default)]
pub struct SnapshotParts {
    location: Option<Location>,
    units: Option<UnitSystem>,
    fetched_at: Option<DateTime<FixedOffset>>,
    grid: Option<GridPoint>,
    station: Option<Station>,
    current: Option<CurrentConditions>,
    forecast: Option<Forecast>,
    sun_times: Option<SunTimes>,
}

impl SnapshotParts {
    /// Starts a snapshot stamped with the current time in the location's zone.
    pub fn new(location: Location, units: UnitSystem) -> Self {
        let fetched_at = Utc::now().with_timezone(&location.timezone).fixed_offset();
        Self {
            location: Some(location),
            units: Some(units),
            fetched_at: Some(fetched_at),
            ..Self::default()
        }
    }

    pub fn fetched_at(mut self, fetched_at: DateTime<FixedOffset>) -> Self {
        self.fetched_at = Some(fetched_at);
        self
    }

    pub fn grid(mut self, grid: GridPoint) -> Self {
        self.grid = Some(grid);
        self
    }

    pub fn station(mut self, station: Station) -> Self {
        self.station = Some(station);
        self
    }

    pub fn current(mut self, current: CurrentConditions) -> Self {
        self.current = Some(current);
        self
    }

    pub fn forecast(mut self, forecast: Forecast) -> Self {
        self.forecast = Some(forecast);
        self
    }

    pub fn sun_times(mut self, sun_times: SunTimes) -> Self {
        self.sun_times = Some(sun_times);
        self
    }

    pub fn assemble(self) -> Result<WeatherSnapshot, WeatherError> {
        let missing = |missing| WeatherError::IncompleteSnapshot { missing };

        Ok(WeatherSnapshot {
            location: self.location.ok_or_else(|| missing("location"))?,
            units: self.units.ok_or_else(|| missing("unit system"))?,
            fetched_at: self.fetched_at.ok_or_else(|| missing("fetch time"))?,
            grid: self.grid.ok_or_else(|| missing("grid point"))?,
            station: self.station.ok_or_else(|| missing("station"))?,
            current: self.current.ok_or_else(|| missing("current conditions"))?,
            forecast: self.forecast.ok_or_else(|| missing("forecast"))?,
            sun_times: self.sun_times.ok_or_else(|| missing("sun times"))?,
        })
    }
}

/// Entry point: postal code in, [`WeatherSnapshot`] out.
#[derive(Debug)]
pub struct WeatherService {
    resolver: Box<dyn LocationResolver>,
    gateway: WeatherGateway,
    suntime: Box<dyn SuntimeProvider>,
    converter: UnitConverter,
}

impl WeatherService {
    pub fn new(resolver: Box<dyn LocationResolver>, gateway: WeatherGateway) -> Self {
        Self {
            resolver,
            gateway,
            suntime: Box::new(SolarSuntime),
            converter: UnitConverter::default(),
        }
    }

    pub fn with_suntime(mut self, suntime: Box<dyn SuntimeProvider>) -> Self {
        self.suntime = suntime;
        self
    }

    /// First location matching `postal_code`.
    pub async fn resolve(&self, postal_code: &str) -> Result<Location, WeatherError> {
        self.resolver
            .matching(postal_code)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::LocationNotFound {
                postal_code: postal_code.trim().to_string(),
            })
    }

    /// Fetch using a free-form unit selector (`"f"`/`"us"` for imperial).
    pub async fn fetch_with_selector(
        &self,
        postal_code: &str,
        selector: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.fetch_weather(postal_code, UnitSystem::from_selector(selector))
            .await
    }

    pub async fn fetch_weather(
        &self,
        postal_code: &str,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let location = self.resolve(postal_code).await?;
        debug!(
            postal_code = %location.postal_code,
            city = %location.city,
            lat = location.latitude,
            lon = location.longitude,
            "resolved location"
        );

        let today = Utc::now().with_timezone(&location.timezone).date_naive();
        self.fetch_for_location(location, units, today).await
    }

    /// Fetch for an already resolved location; sun times are for `date`.
    pub async fn fetch_for_location(
        &self,
        location: Location,
        units: UnitSystem,
        date: NaiveDate,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let sun_times = self.suntime.sun_times(&location, date);

        let (lat, lon) = location.coordinates();
        let payload = self.gateway.fetch_all(lat, lon, units).await?;

        let tz = location.timezone;
        let forecast = ForecastProcessor::new(&self.converter, units, tz)
            .process(&payload.hourly, &payload.daily)?;
        let current = CurrentConditionsProcessor::new(&self.converter, units, tz)
            .process(&payload.observation)?;

        let snapshot = SnapshotParts::new(location, units)
            .grid(payload.meta.grid_point())
            .station(payload.station)
            .forecast(forecast)
            .current(current)
            .sun_times(sun_times)
            .assemble()?;

        info!(
            postal_code = %snapshot.location.postal_code,
            station = %snapshot.station.identifier,
            periods = snapshot.forecast.periods.len(),
            %units,
            "weather snapshot assembled"
        );
        Ok(snapshot)
    }
}

/// Build a service wired to the endpoints in `config`.
pub fn service_from_config(config: &Config) -> anyhow::Result<WeatherService> {
    use anyhow::Context;

    let gateway = WeatherGateway::with_user_agent(
        config.service.base_url.as_str(),
        &config.service.user_agent,
    )
    .context("Failed to build HTTP client for the weather service")?;

    let resolver = ZippopotamResolver::new(
        config.resolver.base_url.as_str(),
        reqwest::Client::new(),
    );

    Ok(WeatherService::new(Box::new(resolver), gateway))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{DisplayUnit, MeasuredValue, Reading};
    use chrono::{DateTime, FixedOffset};

    fn location() -> Location {
        Location::new("95134", "San Jose", "CA", 37.4073, -121.9429, "America/Los_Angeles")
            .unwrap()
    }

    fn station() -> Station {
        Station {
            id: "https://api.weather.gov/stations/KSJC".to_string(),
            identifier: "KSJC".to_string(),
            name: "San Jose International Airport".to_string(),
        }
    }

    fn now() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-05-01T11:53:00-07:00").unwrap()
    }

    fn current() -> CurrentConditions {
        CurrentConditions {
            timestamp: now(),
            description: Some("Clear".to_string()),
            raw_message: None,
            temperature: Reading::Measured(MeasuredValue {
                magnitude: 22.0,
                unit: DisplayUnit::Celsius,
            }),
            dewpoint: Reading::NoData,
            relative_humidity: Reading::NoData,
            wind_direction: Reading::NoData,
            wind_speed: Reading::NoData,
            wind_gust: Reading::NoData,
            barometric_pressure: Reading::NoData,
            sea_level_pressure: Reading::NoData,
            visibility: Reading::NoData,
            max_temperature_last_24_hours: Reading::NoData,
            min_temperature_last_24_hours: Reading::NoData,
            precipitation_last_hour: Reading::NoData,
            precipitation_last_3_hours: Reading::NoData,
            precipitation_last_6_hours: Reading::NoData,
            wind_chill: Reading::NoData,
            heat_index: Reading::NoData,
            elevation: Reading::NoData,
            cloud_layers: Vec::new(),
        }
    }

    fn forecast() -> Forecast {
        Forecast {
            elevation: Reading::NoData,
            generated_at: now(),
            updated_at: now(),
            periods: Vec::new(),
            immediate: "Today: Sunny.".to_string(),
        }
    }

    fn grid() -> GridPoint {
        GridPoint {
            grid_id: Some("MTR".to_string()),
            grid_x: Some(99),
            grid_y: Some(60),
            time_zone: Some("America/Los_Angeles".to_string()),
        }
    }

    fn sun_times() -> SunTimes {
        SunTimes {
            sunrise: None,
            sunset: None,
        }
    }

    #[test]
    fn assemble_with_all_parts() {
        let snapshot = SnapshotParts::new(location(), UnitSystem::Metric)
            .fetched_at(now())
            .grid(grid())
            .station(station())
            .current(current())
            .forecast(forecast())
            .sun_times(sun_times())
            .assemble()
            .unwrap();

        assert_eq!(snapshot.station().identifier, "KSJC");
        assert_eq!(snapshot.units(), UnitSystem::Metric);
        assert_eq!(snapshot.location().city, "San Jose");
        assert_eq!(snapshot.current().temperature.to_string(), "22.0 °C");
        assert_eq!(snapshot.grid().grid_id.as_deref(), Some("MTR"));
        assert_eq!(snapshot.fetched_at(), now());
    }

    #[test]
    fn new_parts_are_stamped_in_location_zone() {
        let snapshot = SnapshotParts::new(location(), UnitSystem::Metric)
            .grid(grid())
            .station(station())
            .current(current())
            .forecast(forecast())
            .sun_times(sun_times())
            .assemble()
            .unwrap();

        let offset = snapshot.fetched_at().offset().local_minus_utc();
        assert!(offset == -7 * 3600 || offset == -8 * 3600, "{offset}");
    }

    #[test]
    fn assemble_without_grid_is_incomplete() {
        let err = SnapshotParts::new(location(), UnitSystem::Metric)
            .station(station())
            .current(current())
            .forecast(forecast())
            .sun_times(sun_times())
            .assemble()
            .unwrap_err();

        assert!(matches!(err, WeatherError::IncompleteSnapshot { missing: "grid point" }));
    }

    #[test]
    fn assemble_without_station_is_incomplete() {
        let err = SnapshotParts::new(location(), UnitSystem::Metric)
            .grid(grid())
            .current(current())
            .forecast(forecast())
            .sun_times(sun_times())
            .assemble()
            .unwrap_err();

        assert!(matches!(err, WeatherError::IncompleteSnapshot { missing: "station" }));
    }

    #[test]
    fn assemble_from_nothing_reports_location_first() {
        let err = SnapshotParts::default().assemble().unwrap_err();
        assert!(matches!(err, WeatherError::IncompleteSnapshot { missing: "location" }));
    }

    #[test]
    fn service_from_default_config_builds() {
        let service = service_from_config(&Config::default()).unwrap();
        assert_eq!(service.gateway.base_url(), crate::gateway::DEFAULT_BASE_URL);
    }
}
