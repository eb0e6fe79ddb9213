// Fixed-point register values: `raw / 10^scale`

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{Result, SeriesError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedPoint {
    pub raw: i64,
    pub scale: u32,
}

impl FixedPoint {
    pub fn new(raw: i64, scale: u32) -> Self {
        Self { raw, scale }
    }

    pub fn to_f64(&self) -> f64 {
        self.raw as f64 / 10f64.powi(self.scale as i32)
    }

    /// Re-expresses the value at a finer (or equal) scale.
    pub fn rescale(&self, scale: u32) -> Result<FixedPoint> {
        let overflow = || SeriesError::ScaleOverflow {
            raw: self.raw,
            from: self.scale,
            to: scale,
        };

        if scale < self.scale {
            return Err(overflow());
        }

        let raw = 10i64
            .checked_pow(scale - self.scale)
            .and_then(|factor| self.raw.checked_mul(factor))
            .ok_or_else(overflow)?;

        Ok(FixedPoint { raw, scale })
    }

    /// Multiplies the value by `10^exponent`, preferring to move the scale
    /// over touching `raw`.
    pub fn shift(&self, exponent: i32) -> Result<FixedPoint> {
        if exponent <= 0 {
            return Ok(FixedPoint {
                raw: self.raw,
                scale: self.scale + exponent.unsigned_abs(),
            });
        }

        let exponent = exponent as u32;
        if self.scale >= exponent {
            return Ok(FixedPoint {
                raw: self.raw,
                scale: self.scale - exponent,
            });
        }

        let remaining = exponent - self.scale;
        let raw = 10i64
            .checked_pow(remaining)
            .and_then(|factor| self.raw.checked_mul(factor))
            .ok_or(SeriesError::ScaleOverflow {
                raw: self.raw,
                from: self.scale,
                to: 0,
            })?;

        Ok(FixedPoint { raw, scale: 0 })
    }

    /// Brings both values to the finer of the two scales.
    pub fn align(a: FixedPoint, b: FixedPoint) -> Result<(FixedPoint, FixedPoint)> {
        let scale = a.scale.max(b.scale);
        Ok((a.rescale(scale)?, b.rescale(scale)?))
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f64())
    }
}
