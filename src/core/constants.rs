// Engine constants

use crate::core::units::Unit;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

// Default register moduli as (unit, scale, modulus in raw counts).
// These are assumed register widths, to be checked against device firmware:
//   Wh   scale 0: unsigned 32-bit Wh counter
//   kWh  scale 1: 6-digit display, rolls after 99999.9
//   kWh  scale 3: 8-digit display, rolls after 99999.999
//   L    scale 0: unsigned 32-bit litre counter
//   m3   scale 3: 8-digit water register
//   GJ   scale 3: 8-digit heat register
pub const U32_REGISTER: i64 = 1 << 32;
pub const SIX_DIGIT_REGISTER: i64 = 1_000_000;
pub const EIGHT_DIGIT_REGISTER: i64 = 100_000_000;

pub fn default_moduli() -> [(Unit, u32, i64); 6] {
    [
        (Unit::WattHour, 0, U32_REGISTER),
        (Unit::KilowattHour, 1, SIX_DIGIT_REGISTER),
        (Unit::KilowattHour, 3, EIGHT_DIGIT_REGISTER),
        (Unit::Litre, 0, U32_REGISTER),
        (Unit::CubicMetre, 3, EIGHT_DIGIT_REGISTER),
        (Unit::Gigajoule, 3, EIGHT_DIGIT_REGISTER),
    ]
}
