//! Postal code lookup.
//!
//! The weather pipeline only depends on the [`LocationResolver`] trait. Two
//! resolvers ship with the crate: [`ZippopotamResolver`] queries
//! `api.zippopotam.us`, and [`StaticResolver`] serves a fixed set of records.

use async_trait::async_trait;
use chrono_tz::Tz;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

use crate::error::WeatherError;

pub const DEFAULT_RESOLVER_URL: &str = "https://api.zippopotam.us";

/// Where a postal code is. Created once per snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub postal_code: String,
    pub city: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: Tz,
}

impl Location {
    /// Build a location from an IANA zone name.
    pub fn new(
        postal_code: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<Self, WeatherError> {
        let timezone = timezone
            .parse::<Tz>()
            .map_err(|_| WeatherError::InvalidTimeZone {
                zone: timezone.to_string(),
            })?;

        Ok(Self {
            postal_code: postal_code.into(),
            city: city.into(),
            state: state.into(),
            latitude,
            longitude,
            timezone,
        })
    }

    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

#[async_trait]
pub trait LocationResolver: Send + Sync + Debug {
    /// All records matching `postal_code`, best match first. Empty when unknown.
    async fn matching(&self, postal_code: &str) -> Result<Vec<Location>, WeatherError>;
}

/// Serves lookups from an in-memory list.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    locations: Vec<Location>,
}

impl StaticResolver {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }
}

#[async_trait]
impl LocationResolver for StaticResolver {
    async fn matching(&self, postal_code: &str) -> Result<Vec<Location>, WeatherError> {
        let postal_code = postal_code.trim();
        Ok(self
            .locations
            .iter()
            .filter(|l| l.postal_code == postal_code)
            .cloned()
            .collect())
    }
}

/// Resolves US postal codes through the Zippopotam.us HTTP API.
#[derive(Debug, Clone)]
pub struct ZippopotamResolver {
    base_url: String,
    http: Client,
}

impl ZippopotamResolver {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }
}

impl Default for ZippopotamResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLVER_URL, Client::new())
    }
}

#[derive(Debug, Deserialize)]
struct ZipResponse {
    #[serde(rename = "post code")]
    post_code: String,
    places: Vec<ZipPlace>,
}

#[derive(Debug, Deserialize)]
struct ZipPlace {
    #[serde(rename = "place name")]
    place_name: String,
    #[serde(rename = "state abbreviation")]
    state_abbreviation: String,
    latitude: String,
    longitude: String,
}

#[async_trait]
impl LocationResolver for ZippopotamResolver {
    async fn matching(&self, postal_code: &str) -> Result<Vec<Location>, WeatherError> {
        let postal_code = postal_code.trim();
        let lookup_err = |reason: String| WeatherError::Lookup {
            postal_code: postal_code.to_string(),
            reason,
        };

        let url = format!("{}/us/{}", self.base_url, postal_code);
        debug!(%url, "resolving postal code");

        let res = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| lookup_err(e.to_string()))?;

        // Unknown codes come back as 404 with an empty object.
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !res.status().is_success() {
            return Err(lookup_err(format!("status {}", res.status())));
        }

        let body = res.text().await.map_err(|e| lookup_err(e.to_string()))?;
        let parsed: ZipResponse =
            serde_json::from_str(&body).map_err(|e| lookup_err(e.to_string()))?;

        parsed
            .places
            .into_iter()
            .map(|place| {
                let latitude = place
                    .latitude
                    .parse::<f64>()
                    .map_err(|_| lookup_err(format!("bad latitude '{}'", place.latitude)))?;
                let longitude = place
                    .longitude
                    .parse::<f64>()
                    .map_err(|_| lookup_err(format!("bad longitude '{}'", place.longitude)))?;
                let timezone = state_time_zone(&place.state_abbreviation).ok_or_else(|| {
                    lookup_err(format!("no time zone for state '{}'", place.state_abbreviation))
                })?;

                Ok(Location {
                    postal_code: parsed.post_code.clone(),
                    city: place.place_name,
                    state: place.state_abbreviation,
                    latitude,
                    longitude,
                    timezone,
                })
            })
            .collect()
    }
}

/// Prevailing time zone of a US state or territory.
///
/// States split across zones map to the zone covering most of the population.
pub fn state_time_zone(abbreviation: &str) -> Option<Tz> {
    use chrono_tz::{America, Pacific};

    let tz = match abbreviation.to_uppercase().as_str() {
        "CT" | "DC" | "DE" | "FL" | "GA" | "KY" | "MA" | "MD" | "ME" | "NC" | "NH" | "NJ"
        | "NY" | "OH" | "PA" | "RI" | "SC" | "VA" | "VT" | "WV" => America::New_York,
        "MI" => America::Detroit,
        "IN" => America::Indiana::Indianapolis,
        "AL" | "AR" | "IA" | "IL" | "KS" | "LA" | "MN" | "MO" | "MS" | "ND" | "NE" | "OK"
        | "SD" | "TN" | "TX" | "WI" => America::Chicago,
        "CO" | "MT" | "NM" | "UT" | "WY" => America::Denver,
        "ID" => America::Boise,
        "AZ" => America::Phoenix,
        "CA" | "NV" | "OR" | "WA" => America::Los_Angeles,
        "AK" => America::Anchorage,
        "HI" => Pacific::Honolulu,
        "PR" => America::Puerto_Rico,
        "VI" => America::St_Thomas,
        "GU" => Pacific::Guam,
        "AS" => Pacific::Pago_Pago,
        _ => return None,
    };

    Some(tz)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn san_jose() -> Location {
        Location::new("95134", "San Jose", "CA", 37.4073, -121.9429, "America/Los_Angeles")
            .expect("valid zone")
    }

    #[test]
    fn location_rejects_unknown_zone() {
        let err = Location::new("95134", "San Jose", "CA", 37.4, -121.9, "Mars/Olympus")
            .unwrap_err();
        assert!(matches!(err, WeatherError::InvalidTimeZone { ref zone } if zone == "Mars/Olympus"));
    }

    #[tokio::test]
    async fn static_resolver_matches_trimmed_code() {
        let resolver = StaticResolver::new(vec![san_jose()]);
        let found = resolver.matching(" 95134 ").await.unwrap();
        assert_eq!(found, vec![san_jose()]);
    }

    #[tokio::test]
    async fn static_resolver_returns_empty_for_unknown_code() {
        let resolver = StaticResolver::new(vec![san_jose()]);
        assert!(resolver.matching("10001").await.unwrap().is_empty());
    }

    #[test]
    fn state_time_zones() {
        assert_eq!(state_time_zone("ca"), Some(chrono_tz::America::Los_Angeles));
        assert_eq!(state_time_zone("NY"), Some(chrono_tz::America::New_York));
        assert_eq!(state_time_zone("AZ"), Some(chrono_tz::America::Phoenix));
        assert_eq!(state_time_zone("ZZ"), None);
    }
}
