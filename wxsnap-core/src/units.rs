use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

const KM_PER_MILE: f64 = 1.609_344;
const METERS_PER_MILE: f64 = 1_609.344;
const MM_PER_INCH: f64 = 25.4;
const PASCALS_PER_INHG: f64 = 3_386.389;

/// Display convention selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    Imperial,
}

impl UnitSystem {
    /// Interpret a user-supplied selector. `f` and `us` (any case) mean imperial,
    /// anything else means metric.
    pub fn from_selector(selector: &str) -> Self {
        match selector.trim().to_lowercase().as_str() {
            "f" | "us" => UnitSystem::Imperial,
            _ => UnitSystem::Metric,
        }
    }

    /// Value of the `units` query parameter understood by the forecast endpoints.
    pub fn as_query_param(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "si",
            UnitSystem::Imperial => "us",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Metric => f.write_str("metric"),
            UnitSystem::Imperial => f.write_str("imperial"),
        }
    }
}

/// Unit a normalized value is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayUnit {
    Celsius,
    Fahrenheit,
    KilometersPerHour,
    MilesPerHour,
    Kilometers,
    Miles,
    Millimeters,
    Inches,
    Millibars,
    InchesOfMercury,
    Percent,
    Degrees,
}

impl DisplayUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            DisplayUnit::Celsius => "°C",
            DisplayUnit::Fahrenheit => "°F",
            DisplayUnit::KilometersPerHour => "km/h",
            DisplayUnit::MilesPerHour => "mph",
            DisplayUnit::Kilometers => "km",
            DisplayUnit::Miles => "mi",
            DisplayUnit::Millimeters => "mm",
            DisplayUnit::Inches => "in",
            DisplayUnit::Millibars => "mbar",
            DisplayUnit::InchesOfMercury => "inHg",
            DisplayUnit::Percent => "%",
            DisplayUnit::Degrees => "°",
        }
    }
}

/// A magnitude already normalized to the snapshot's unit system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeasuredValue {
    pub magnitude: f64,
    pub unit: DisplayUnit,
}

impl fmt::Display for MeasuredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.unit {
            DisplayUnit::Percent => write!(f, "{:.1}%", self.magnitude),
            unit => write!(f, "{:.1} {}", self.magnitude, unit.symbol()),
        }
    }
}

/// A measured field as exposed downstream: either a value or an explicit gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reading {
    Measured(MeasuredValue),
    NoData,
}

impl Reading {
    pub fn measured(&self) -> Option<&MeasuredValue> {
        match self {
            Reading::Measured(value) => Some(value),
            Reading::NoData => None,
        }
    }

    pub fn magnitude(&self) -> Option<f64> {
        self.measured().map(|v| v.magnitude)
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Reading::NoData)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Measured(value) => value.fmt(f),
            Reading::NoData => f.write_str("no data"),
        }
    }
}

/// How a source magnitude maps onto a display unit.
///
/// Temperature scales are affine, so they carry an offset; everything else is
/// a plain ratio or passes through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    Ratio(f64),
    Affine { scale: f64, offset: f64 },
    Identity,
    PercentPassthrough,
}

impl Conversion {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Conversion::Ratio(factor) => value * factor,
            Conversion::Affine { scale, offset } => value * scale + offset,
            Conversion::Identity | Conversion::PercentPassthrough => value,
        }
    }

    pub fn invert(self, value: f64) -> f64 {
        match self {
            Conversion::Ratio(factor) => value / factor,
            Conversion::Affine { scale, offset } => (value - offset) / scale,
            Conversion::Identity | Conversion::PercentPassthrough => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub unit: DisplayUnit,
    pub conversion: Conversion,
}

impl Target {
    const fn new(unit: DisplayUnit, conversion: Conversion) -> Self {
        Self { unit, conversion }
    }
}

/// Registry row: where a source unit lands in each unit system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitEntry {
    pub metric: Target,
    pub imperial: Target,
}

impl UnitEntry {
    pub fn target(&self, system: UnitSystem) -> Target {
        match system {
            UnitSystem::Metric => self.metric,
            UnitSystem::Imperial => self.imperial,
        }
    }
}

/// Immutable mapping from source unit codes to their display targets.
#[derive(Debug, Clone)]
pub struct UnitRegistry {
    entries: HashMap<&'static str, UnitEntry>,
}

impl UnitRegistry {
    /// Registry covering every unit code the weather service emits.
    pub fn standard() -> Self {
        use Conversion::{Affine, Identity, PercentPassthrough, Ratio};
        use DisplayUnit::*;

        let celsius = UnitEntry {
            metric: Target::new(Celsius, Identity),
            imperial: Target::new(Fahrenheit, Affine { scale: 1.8, offset: 32.0 }),
        };
        let fahrenheit = UnitEntry {
            metric: Target::new(Celsius, Affine { scale: 5.0 / 9.0, offset: -160.0 / 9.0 }),
            imperial: Target::new(Fahrenheit, Identity),
        };
        let km_per_hour = UnitEntry {
            metric: Target::new(KilometersPerHour, Identity),
            imperial: Target::new(MilesPerHour, Ratio(1.0 / KM_PER_MILE)),
        };
        let meters_per_second = UnitEntry {
            metric: Target::new(KilometersPerHour, Ratio(3.6)),
            imperial: Target::new(MilesPerHour, Ratio(3_600.0 / METERS_PER_MILE)),
        };
        let miles_per_hour = UnitEntry {
            metric: Target::new(KilometersPerHour, Ratio(KM_PER_MILE)),
            imperial: Target::new(MilesPerHour, Identity),
        };
        let meters = UnitEntry {
            metric: Target::new(Kilometers, Ratio(0.001)),
            imperial: Target::new(Miles, Ratio(1.0 / METERS_PER_MILE)),
        };
        let millimeters = UnitEntry {
            metric: Target::new(Millimeters, Identity),
            imperial: Target::new(Inches, Ratio(1.0 / MM_PER_INCH)),
        };
        let pascals = UnitEntry {
            metric: Target::new(Millibars, Ratio(0.01)),
            imperial: Target::new(InchesOfMercury, Ratio(1.0 / PASCALS_PER_INHG)),
        };
        let percent = UnitEntry {
            metric: Target::new(Percent, PercentPassthrough),
            imperial: Target::new(Percent, PercentPassthrough),
        };
        let angle = UnitEntry {
            metric: Target::new(Degrees, Identity),
            imperial: Target::new(Degrees, Identity),
        };

        let entries = HashMap::from([
            ("degC", celsius),
            ("degree Celsius", celsius),
            ("degF", fahrenheit),
            ("km_h-1", km_per_hour),
            ("kilometer / hour", km_per_hour),
            ("m_s-1", meters_per_second),
            ("mph", miles_per_hour),
            ("m", meters),
            ("mm", millimeters),
            ("Pa", pascals),
            ("percent", percent),
            ("degree_(angle)", angle),
        ]);

        Self { entries }
    }

    /// Look up a source code, ignoring any `namespace:` prefix.
    pub fn lookup(&self, code: &str) -> Result<&UnitEntry, ConversionError> {
        let bare = strip_namespace(code);
        self.entries
            .get(bare)
            .ok_or_else(|| ConversionError::UnknownUnit(code.to_string()))
    }

    pub fn codes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }
}

impl Default for UnitRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn strip_namespace(code: &str) -> &str {
    code.rsplit_once(':').map_or(code, |(_, bare)| bare)
}

/// Maps free-text unit tokens (as used in forecast wind speeds) to registry codes.
fn expression_unit_code(token: &str) -> Option<&'static str> {
    match token {
        "km/h" | "kph" => Some("km_h-1"),
        "mph" => Some("mph"),
        "m/s" => Some("m_s-1"),
        _ => None,
    }
}

/// Stateless converter from source quantities to the caller's unit system.
#[derive(Debug, Clone, Default)]
pub struct UnitConverter {
    registry: UnitRegistry,
}

impl UnitConverter {
    pub fn new(registry: UnitRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    /// Convert a `(value, unit code)` pair.
    ///
    /// A missing value is [`Reading::NoData`] regardless of the unit code; a
    /// present value with an unknown code is an error.
    pub fn convert(
        &self,
        value: Option<f64>,
        unit_code: &str,
        system: UnitSystem,
    ) -> Result<Reading, ConversionError> {
        match value {
            Some(value) => self.convert_value(value, unit_code, system).map(Reading::Measured),
            None => Ok(Reading::NoData),
        }
    }

    /// Convert a value the source always reports.
    pub fn convert_value(
        &self,
        value: f64,
        unit_code: &str,
        system: UnitSystem,
    ) -> Result<MeasuredValue, ConversionError> {
        let target = self.registry.lookup(unit_code)?.target(system);
        Ok(MeasuredValue {
            magnitude: target.conversion.apply(value),
            unit: target.unit,
        })
    }

    /// Convert a unit-bearing text such as `"13 km/h"` or `"5 to 10 km/h"`.
    ///
    /// Ranges resolve to their upper bound. An empty expression is `NoData`.
    pub fn convert_expression(
        &self,
        expression: &str,
        system: UnitSystem,
    ) -> Result<Reading, ConversionError> {
        let tokens: Vec<&str> = expression.split_whitespace().collect();
        let unparseable = || ConversionError::Unparseable(expression.to_string());

        let (number, unit) = match tokens.as_slice() {
            [] => return Ok(Reading::NoData),
            [number, unit] => (*number, *unit),
            [low, "to", high, unit] => {
                low.parse::<f64>().map_err(|_| unparseable())?;
                (*high, *unit)
            }
            _ => return Err(unparseable()),
        };

        let value: f64 = number.parse().map_err(|_| unparseable())?;
        let code = expression_unit_code(unit)
            .ok_or_else(|| ConversionError::UnknownUnit(unit.to_string()))?;

        self.convert(Some(value), code, system)
    }

    /// Map a normalized value back to the source unit it was converted from.
    pub fn revert(
        &self,
        value: &MeasuredValue,
        unit_code: &str,
        system: UnitSystem,
    ) -> Result<f64, ConversionError> {
        let target = self.registry.lookup(unit_code)?.target(system);
        Ok(target.conversion.invert(value.magnitude))
    }
}
