// Measurement units for register samples and derived intervals

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{Result, SeriesError};
use crate::core::fixed_point::FixedPoint;

/// Physical quantity a unit measures. Units of the same family differ only
/// by a power of ten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Energy,
    Volume,
    Heat,
    Power,
    Flow,
    HeatRate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Unit {
    WattHour,
    KilowattHour,
    MegawattHour,
    Litre,
    CubicMetre,
    Megajoule,
    Gigajoule,
    Watt,
    Kilowatt,
    Megawatt,
    LitrePerHour,
    CubicMetrePerHour,
    MegajoulePerHour,
    GigajoulePerHour,
    /// Rate of a unit that has no known per-hour counterpart.
    UnknownRate,
    /// A symbol none of the variants above recognise. Build it with
    /// [`Unit::other`] or [`Unit::from_symbol`]; an `Other` holding a known
    /// symbol such as `"kWh"` deserializes back as the named variant.
    Other(String),
}

impl Unit {
    pub fn symbol(&self) -> &str {
        match self {
            Unit::WattHour => "Wh",
            Unit::KilowattHour => "kWh",
            Unit::MegawattHour => "MWh",
            Unit::Litre => "L",
            Unit::CubicMetre => "m3",
            Unit::Megajoule => "MJ",
            Unit::Gigajoule => "GJ",
            Unit::Watt => "W",
            Unit::Kilowatt => "kW",
            Unit::Megawatt => "MW",
            Unit::LitrePerHour => "L/h",
            Unit::CubicMetrePerHour => "m3/h",
            Unit::MegajoulePerHour => "MJ/h",
            Unit::GigajoulePerHour => "GJ/h",
            Unit::UnknownRate => "?/h",
            Unit::Other(symbol) => symbol,
        }
    }

    pub fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "Wh" => Unit::WattHour,
            "kWh" => Unit::KilowattHour,
            "MWh" => Unit::MegawattHour,
            "L" | "l" => Unit::Litre,
            "m3" | "m³" => Unit::CubicMetre,
            "MJ" => Unit::Megajoule,
            "GJ" => Unit::Gigajoule,
            "W" => Unit::Watt,
            "kW" => Unit::Kilowatt,
            "MW" => Unit::Megawatt,
            "L/h" | "l/h" => Unit::LitrePerHour,
            "m3/h" | "m³/h" => Unit::CubicMetrePerHour,
            "MJ/h" => Unit::MegajoulePerHour,
            "GJ/h" => Unit::GigajoulePerHour,
            "?/h" => Unit::UnknownRate,
            other => Unit::Other(other.to_string()),
        }
    }

    /// Unit for a free-form symbol, resolved to a named variant when known.
    pub fn other(symbol: impl Into<String>) -> Self {
        Unit::from(symbol.into())
    }

    /// Family and power-of-ten exponent relative to the family's base unit.
    pub fn dimension(&self) -> Option<(Family, i32)> {
        let dim = match self {
            Unit::WattHour => (Family::Energy, 0),
            Unit::KilowattHour => (Family::Energy, 3),
            Unit::MegawattHour => (Family::Energy, 6),
            Unit::Litre => (Family::Volume, 0),
            Unit::CubicMetre => (Family::Volume, 3),
            Unit::Megajoule => (Family::Heat, 0),
            Unit::Gigajoule => (Family::Heat, 3),
            Unit::Watt => (Family::Power, 0),
            Unit::Kilowatt => (Family::Power, 3),
            Unit::Megawatt => (Family::Power, 6),
            Unit::LitrePerHour => (Family::Flow, 0),
            Unit::CubicMetrePerHour => (Family::Flow, 3),
            Unit::MegajoulePerHour => (Family::HeatRate, 0),
            Unit::GigajoulePerHour => (Family::HeatRate, 3),
            Unit::UnknownRate | Unit::Other(_) => return None,
        };
        Some(dim)
    }

    /// Per-hour rate unit of an accumulating unit.
    pub fn rate_unit(&self) -> Unit {
        match self {
            Unit::WattHour => Unit::Watt,
            Unit::KilowattHour => Unit::Kilowatt,
            Unit::MegawattHour => Unit::Megawatt,
            Unit::Litre => Unit::LitrePerHour,
            Unit::CubicMetre => Unit::CubicMetrePerHour,
            Unit::Megajoule => Unit::MegajoulePerHour,
            Unit::Gigajoule => Unit::GigajoulePerHour,
            _ => Unit::UnknownRate,
        }
    }

    /// Expresses `value`, measured in `from`, in this unit.
    pub fn convert_from(&self, value: FixedPoint, from: &Unit) -> Result<FixedPoint> {
        if self == from {
            return Ok(value);
        }

        let incompatible = || SeriesError::IncompatibleUnits {
            minuend: self.clone(),
            subtrahend: from.clone(),
        };

        let (target_family, target_exp) = self.dimension().ok_or_else(incompatible)?;
        let (source_family, source_exp) = from.dimension().ok_or_else(incompatible)?;

        if target_family != source_family {
            return Err(incompatible());
        }

        value.shift(source_exp - target_exp)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl From<String> for Unit {
    fn from(symbol: String) -> Self {
        Unit::from_symbol(&symbol)
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        unit.symbol().to_string()
    }
}
