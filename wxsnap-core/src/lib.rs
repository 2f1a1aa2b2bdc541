//! Core library for the `wxsnap` CLI.
//!
//! This crate defines:
//! - Postal code resolution and the api.weather.gov call chain
//! - Unit normalization into metric or US customary units
//! - The immutable [`WeatherSnapshot`] assembled from those pieces
//! - Configuration handling
//!
//! It is used by `wxsnap-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod gateway;
pub mod location;
pub mod model;
pub mod processor;
pub mod snapshot;
pub mod suntime;
pub mod units;

pub use config::Config;
pub use error::{ConversionError, GatewayError, GatewayErrorKind, WeatherError};
pub use gateway::WeatherGateway;
pub use location::{Location, LocationResolver, StaticResolver, ZippopotamResolver};
pub use model::{
    CloudCoverage, CloudLayer, CurrentConditions, Forecast, ForecastPeriod, GridPoint, Station,
    SunTimes,
};
pub use snapshot::{SnapshotParts, WeatherService, WeatherSnapshot, service_from_config};
pub use suntime::{SolarSuntime, SuntimeProvider};
pub use units::{DisplayUnit, MeasuredValue, Reading, UnitConverter, UnitSystem};
