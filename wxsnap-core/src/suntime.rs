use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Debug;
use sunrise::{Coordinates, SolarDay, SolarEvent};
use tracing::warn;

use crate::{location::Location, model::SunTimes};

pub trait SuntimeProvider: Send + Sync + Debug {
    /// Sunrise and sunset on `date` (the location's local calendar day).
    fn sun_times(&self, location: &Location, date: NaiveDate) -> SunTimes;
}

/// Astronomical sunrise/sunset from the location's coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarSuntime;

impl SuntimeProvider for SolarSuntime {
    fn sun_times(&self, location: &Location, date: NaiveDate) -> SunTimes {
        let Some(coordinates) = Coordinates::new(location.latitude, location.longitude) else {
            warn!(
                lat = location.latitude,
                lon = location.longitude,
                "invalid coordinates, no sun times"
            );
            return SunTimes {
                sunrise: None,
                sunset: None,
            };
        };

        let solar_day = SolarDay::new(coordinates, date);
        let local = |event: SolarEvent| {
            solar_day
                .event_time(event)
                .map(|t: DateTime<Utc>| t.with_timezone(&location.timezone).fixed_offset())
        };

        SunTimes {
            sunrise: local(SolarEvent::Sunrise),
            sunset: local(SolarEvent::Sunset),
        }
    }
}
