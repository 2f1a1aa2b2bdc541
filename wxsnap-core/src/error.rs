use reqwest::StatusCode;
use thiserror::Error;

/// Failure to normalize a measured field.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("unknown unit code '{0}'")]
    UnknownUnit(String),

    #[error("cannot parse quantity expression '{0}'")]
    Unparseable(String),
}

/// What went wrong on a single weather service call.
#[derive(Debug, Error)]
pub enum GatewayErrorKind {
    #[error("status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("transport failure")]
    Transport(#[source] reqwest::Error),

    #[error("malformed response")]
    Decode(#[source] serde_json::Error),

    #[error("response contained no {0}")]
    Empty(&'static str),
}

/// A call in the gateway chain failed. Always names the route that failed.
#[derive(Debug, Error)]
#[error("weather service request to '{route}' failed: {kind}")]
pub struct GatewayError {
    pub route: String,
    #[source]
    pub kind: GatewayErrorKind,
}

impl GatewayError {
    pub fn new(route: impl Into<String>, kind: GatewayErrorKind) -> Self {
        Self {
            route: route.into(),
            kind,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match &self.kind {
            GatewayErrorKind::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("no location matches postal code '{postal_code}'")]
    LocationNotFound { postal_code: String },

    #[error("location lookup for '{postal_code}' failed: {reason}")]
    Lookup { postal_code: String, reason: String },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("snapshot assembled without {missing}")]
    IncompleteSnapshot { missing: &'static str },

    #[error("unknown time zone '{zone}'")]
    InvalidTimeZone { zone: String },
}

impl WeatherError {
    /// Route of the failing weather service call, if this is a gateway failure.
    pub fn route(&self) -> Option<&str> {
        match self {
            WeatherError::Gateway(err) => Some(err.route.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_names_route_and_status() {
        let err = WeatherError::from(GatewayError::new(
            "gridpoints/MTR/99,60/stations",
            GatewayErrorKind::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "oops".to_string(),
            },
        ));

        let msg = err.to_string();
        assert!(msg.contains("gridpoints/MTR/99,60/stations"));
        assert!(msg.contains("500"));
        assert_eq!(err.route(), Some("gridpoints/MTR/99,60/stations"));
    }

    #[test]
    fn location_not_found_mentions_postal_code() {
        let err = WeatherError::LocationNotFound {
            postal_code: "00000".to_string(),
        };
        assert!(err.to_string().contains("00000"));
        assert_eq!(err.route(), None);
    }
}
