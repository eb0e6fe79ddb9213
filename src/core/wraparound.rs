// Wraparound-safe subtraction of cumulative register readings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::core::constants::default_moduli;
use crate::core::error::{Result, SeriesError};
use crate::core::fixed_point::FixedPoint;
use crate::core::interval::DerivedInterval;
use crate::core::sample::NormalizedSample;
use crate::core::units::Unit;

/// One configured register width: a counter in `unit` stored at `scale`
/// rolls over to zero after `modulus` raw counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WraparoundEntry {
    pub unit: Unit,
    pub scale: u32,
    pub modulus: i64,
}

/// Register moduli keyed by `(unit, scale)`.
#[derive(Debug, Clone)]
pub struct WraparoundTable {
    moduli: HashMap<(Unit, u32), i64>,
}

impl WraparoundTable {
    pub fn empty() -> Self {
        Self {
            moduli: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut table = Self::empty();
        for (unit, scale, modulus) in default_moduli() {
            table.moduli.insert((unit, scale), modulus);
        }
        table
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, entry: WraparoundEntry) -> Result<()> {
        if entry.modulus <= 0 {
            return Err(SeriesError::Config(format!(
                "modulus for {} at scale {} must be positive, got {}",
                entry.unit, entry.scale, entry.modulus
            )));
        }
        self.moduli.insert((entry.unit, entry.scale), entry.modulus);
        Ok(())
    }

    pub fn extend<I: IntoIterator<Item = WraparoundEntry>>(&mut self, entries: I) -> Result<()> {
        for entry in entries {
            self.insert(entry)?;
        }
        Ok(())
    }

    pub fn modulus(&self, unit: &Unit, scale: u32) -> Option<i64> {
        self.moduli.get(&(unit.clone(), scale)).copied()
    }

    pub fn len(&self) -> usize {
        self.moduli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moduli.is_empty()
    }
}

impl Default for WraparoundTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Consumption between two readings of one register, in the minuend's unit.
///
/// A negative raw difference means the register rolled over; the modulus
/// configured for the minuend's unit and scale is added back. Without a
/// configured modulus the reading is treated as a counter reset and the
/// result is zero. The result is never negative.
pub fn subtract(
    minuend: &NormalizedSample,
    subtrahend: &NormalizedSample,
    table: &WraparoundTable,
) -> Result<DerivedInterval> {
    let unit = minuend.unit().clone();
    let register_scale = minuend.sample.value.scale;

    let earlier = unit.convert_from(subtrahend.sample.value, subtrahend.unit())?;
    let (current, earlier) = FixedPoint::align(minuend.sample.value, earlier)?;

    let mut raw = current
        .raw
        .checked_sub(earlier.raw)
        .ok_or(SeriesError::ScaleOverflow {
            raw: current.raw,
            from: current.scale,
            to: current.scale,
        })?;

    if raw < 0 {
        raw = match table.modulus(&unit, register_scale) {
            Some(modulus) => {
                let modulus = FixedPoint::new(modulus, register_scale).rescale(current.scale)?;
                let corrected = raw.saturating_add(modulus.raw);
                if corrected >= 0 {
                    debug!(
                        "register wraparound on {}: {} -> {} ({})",
                        minuend.device_id(),
                        earlier,
                        current,
                        unit
                    );
                    corrected
                } else {
                    warn!(
                        "reading {} on {} is below {} beyond one rollover, treating as reset",
                        current,
                        minuend.device_id(),
                        earlier
                    );
                    0
                }
            }
            None => {
                warn!(
                    "no register modulus for {} at scale {}, treating drop {} -> {} on {} as reset",
                    unit,
                    register_scale,
                    earlier,
                    current,
                    minuend.device_id()
                );
                0
            }
        };
    }

    let value = FixedPoint::new(raw, current.scale).to_f64();
    Ok(DerivedInterval::between(subtrahend, minuend, value, unit))
}
