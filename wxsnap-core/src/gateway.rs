//! Client for the api.weather.gov call chain.
//!
//! Each step takes the output of the one before it:
//!
//! ```text
//! coordinates -> GatewayMeta -> (hourly, daily, Station) -> RawObservation
//! ```
//!
//! Any non-success response aborts the chain with a [`GatewayError`] naming
//! the route that failed.

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    error::{GatewayError, GatewayErrorKind},
    model::Station,
    units::UnitSystem,
};

pub mod payload;

use payload::{Envelope, GatewayMeta, RawForecast, RawObservation, StationCollection};

pub const DEFAULT_BASE_URL: &str = "https://api.weather.gov";
pub const DEFAULT_USER_AGENT: &str = concat!("wxsnap/", env!("CARGO_PKG_VERSION"));

/// Everything the chain produced for one location, in call order.
#[derive(Debug, Clone)]
pub struct GatewayPayload {
    pub meta: GatewayMeta,
    pub hourly: RawForecast,
    pub daily: RawForecast,
    pub station: Station,
    pub observation: RawObservation,
}

#[derive(Debug, Clone)]
pub struct WeatherGateway {
    base_url: String,
    http: Client,
}

impl WeatherGateway {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Gateway with its own HTTP client. The service rejects anonymous requests,
    /// so a User-Agent is mandatory.
    pub fn with_user_agent(
        base_url: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().user_agent(user_agent).build()?;
        Ok(Self::new(base_url, http))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run the whole chain for a coordinate pair.
    pub async fn fetch_all(
        &self,
        latitude: f64,
        longitude: f64,
        system: UnitSystem,
    ) -> Result<GatewayPayload, GatewayError> {
        let meta = self.fetch_meta(latitude, longitude).await?;
        let hourly = self.fetch_forecast_hourly(&meta).await?;
        let daily = self.fetch_forecast_daily(&meta, system).await?;
        let station = self.fetch_nearest_station(&meta).await?;
        let observation = self.fetch_latest_observation(&station).await?;

        Ok(GatewayPayload {
            meta,
            hourly,
            daily,
            station,
            observation,
        })
    }

    pub async fn fetch_meta(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<GatewayMeta, GatewayError> {
        let route = format!("points/{},{}", format_coord(latitude), format_coord(longitude));
        let envelope: Envelope<GatewayMeta> = self.get(&route, &[]).await?;
        Ok(envelope.properties)
    }

    /// Hourly periods, always requested in SI units.
    pub async fn fetch_forecast_hourly(
        &self,
        meta: &GatewayMeta,
    ) -> Result<RawForecast, GatewayError> {
        let envelope: Envelope<RawForecast> =
            self.get(&meta.forecast_hourly, &[("units", "si")]).await?;
        Ok(envelope.properties)
    }

    /// Day/night periods in the caller's unit system. Guaranteed non-empty.
    pub async fn fetch_forecast_daily(
        &self,
        meta: &GatewayMeta,
        system: UnitSystem,
    ) -> Result<RawForecast, GatewayError> {
        let envelope: Envelope<RawForecast> = self
            .get(&meta.forecast, &[("units", system.as_query_param())])
            .await?;

        if envelope.properties.periods.is_empty() {
            return Err(GatewayError::new(
                self.route_of(&meta.forecast),
                GatewayErrorKind::Empty("forecast periods"),
            ));
        }
        Ok(envelope.properties)
    }

    pub async fn fetch_nearest_station(&self, meta: &GatewayMeta) -> Result<Station, GatewayError> {
        let collection: StationCollection = self.get(&meta.observation_stations, &[]).await?;

        let nearest = collection.features.into_iter().next().ok_or_else(|| {
            GatewayError::new(
                self.route_of(&meta.observation_stations),
                GatewayErrorKind::Empty("observation stations"),
            )
        })?;

        Ok(Station {
            id: nearest.id,
            identifier: nearest.properties.station_identifier,
            name: nearest.properties.name,
        })
    }

    pub async fn fetch_latest_observation(
        &self,
        station: &Station,
    ) -> Result<RawObservation, GatewayError> {
        let route = format!("{}/observations/latest", station.id);
        let envelope: Envelope<RawObservation> = self.get(&route, &[]).await?;
        Ok(envelope.properties)
    }

    /// Service-relative form of a route or absolute URL. Only URLs on the
    /// base host and path are rewritten; a host that merely shares a prefix
    /// with the base stays absolute.
    fn route_of(&self, route: &str) -> String {
        let relative = match route.strip_prefix(self.base_url.as_str()) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => route,
        };
        relative.trim_start_matches('/').to_string()
    }

    fn url_for(&self, route: &str) -> String {
        if route.starts_with("http://") || route.starts_with("https://") {
            route.to_string()
        } else {
            format!("{}/{}", self.base_url, route)
        }
    }

    async fn get<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let route = self.route_of(route);
        let url = self.url_for(&route);
        debug!(%route, ?query, "weather service request");

        let fail = |kind| GatewayError::new(route.clone(), kind);

        let res = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/geo+json")
            .query(query)
            .send()
            .await
            .map_err(|e| fail(GatewayErrorKind::Transport(e)))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| fail(GatewayErrorKind::Transport(e)))?;

        if !status.is_success() {
            warn!(%route, %status, "weather service returned non-success status");
            return Err(fail(GatewayErrorKind::Status {
                status,
                body: truncate_body(&body),
            }));
        }

        serde_json::from_str(&body).map_err(|e| fail(GatewayErrorKind::Decode(e)))
    }
}

/// Coordinates with at most four decimals; the points endpoint redirects
/// anything more precise.
fn format_coord(value: f64) -> String {
    let fixed = format!("{value:.4}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> WeatherGateway {
        WeatherGateway::new("https://api.weather.gov/", Client::new())
    }

    #[test]
    fn coordinates_are_trimmed_to_four_decimals() {
        assert_eq!(format_coord(37.407_312), "37.4073");
        assert_eq!(format_coord(-121.9), "-121.9");
        assert_eq!(format_coord(40.0), "40");
    }

    #[test]
    fn absolute_urls_become_relative_routes() {
        let gw = gateway();
        assert_eq!(
            gw.route_of("https://api.weather.gov/gridpoints/MTR/99,60/forecast"),
            "gridpoints/MTR/99,60/forecast"
        );
        assert_eq!(gw.route_of("/points/1,2"), "points/1,2");
        assert_eq!(gw.url_for("points/1,2"), "https://api.weather.gov/points/1,2");

        let local = WeatherGateway::new("http://127.0.0.1:1234", Client::new());
        let other_port = "http://127.0.0.1:12345/stations/KSJC";
        assert_eq!(local.route_of(other_port), other_port);
        assert_eq!(local.url_for(&local.route_of(other_port)), other_port);
        assert_eq!(
            local.route_of("http://127.0.0.1:1234/stations/KSJC"),
            "stations/KSJC"
        );
    }

    #[test]
    fn foreign_urls_are_used_verbatim() {
        let gw = gateway();
        let foreign = "https://example.org/stations";
        assert_eq!(gw.route_of(foreign), foreign);
        assert_eq!(gw.url_for(foreign), foreign);
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
