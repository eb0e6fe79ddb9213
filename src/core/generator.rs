// Generator interfaces and the closed set of single-input generators

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::average_rate::AverageRateGenerator;
use crate::core::delta::DeltaGenerator;
use crate::core::error::{Result, SeriesError};
use crate::core::interval::DerivedInterval;
use crate::core::period_total::PeriodTotalGenerator;
use crate::core::sample::NormalizedSample;
use crate::core::series_key::SeriesKey;
use crate::core::wraparound::WraparoundTable;

/// Turns one ordered stream of normalized samples into derived intervals.
///
/// Each successful `calculate_next` appends exactly one interval. Samples
/// must arrive in non-decreasing normalized-timestamp order; a sample from
/// the past is rejected with [`SeriesError::OutOfOrder`] and leaves the
/// generator untouched.
pub trait SingleInputSeriesGenerator {
    fn calculate_next(&mut self, sample: NormalizedSample) -> Result<()>;

    /// All intervals produced so far, in call order.
    fn generated_durations(&self) -> &[DerivedInterval];
}

/// Combines several named derived series into one.
///
/// Callers check `is_satisfied_by` before feeding. `calculate_next` receives
/// one interval per required input, all from the same normalized slot.
pub trait MultiInputSeriesGenerator {
    fn is_satisfied_by(&self, available: &HashMap<SeriesKey, Vec<DerivedInterval>>) -> bool;

    fn calculate_next(&mut self, samples: &HashMap<SeriesKey, DerivedInterval>) -> Result<()>;

    fn generated(&self) -> &[DerivedInterval];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    Delta,
    AverageRate,
    PeriodTotal,
}

#[derive(Debug)]
pub enum SeriesGenerator {
    Delta(DeltaGenerator),
    AverageRate(AverageRateGenerator),
    PeriodTotal(PeriodTotalGenerator),
}

impl SeriesGenerator {
    pub fn new(kind: GeneratorKind, table: Arc<WraparoundTable>) -> Self {
        match kind {
            GeneratorKind::Delta => SeriesGenerator::Delta(DeltaGenerator::new(table)),
            GeneratorKind::AverageRate => {
                SeriesGenerator::AverageRate(AverageRateGenerator::new(table))
            }
            GeneratorKind::PeriodTotal => {
                SeriesGenerator::PeriodTotal(PeriodTotalGenerator::new(table))
            }
        }
    }

    pub fn kind(&self) -> GeneratorKind {
        match self {
            SeriesGenerator::Delta(_) => GeneratorKind::Delta,
            SeriesGenerator::AverageRate(_) => GeneratorKind::AverageRate,
            SeriesGenerator::PeriodTotal(_) => GeneratorKind::PeriodTotal,
        }
    }

    /// Feeds a whole ordered sequence, stopping at the first error.
    pub fn feed<I>(&mut self, samples: I) -> Result<()>
    where
        I: IntoIterator<Item = NormalizedSample>,
    {
        for sample in samples {
            self.calculate_next(sample)?;
        }
        Ok(())
    }

    pub fn into_generated(self) -> Vec<DerivedInterval> {
        match self {
            SeriesGenerator::Delta(g) => g.into_generated(),
            SeriesGenerator::AverageRate(g) => g.into_generated(),
            SeriesGenerator::PeriodTotal(g) => g.into_generated(),
        }
    }
}

impl SingleInputSeriesGenerator for SeriesGenerator {
    fn calculate_next(&mut self, sample: NormalizedSample) -> Result<()> {
        match self {
            SeriesGenerator::Delta(g) => g.calculate_next(sample),
            SeriesGenerator::AverageRate(g) => g.calculate_next(sample),
            SeriesGenerator::PeriodTotal(g) => g.calculate_next(sample),
        }
    }

    fn generated_durations(&self) -> &[DerivedInterval] {
        match self {
            SeriesGenerator::Delta(g) => g.generated_durations(),
            SeriesGenerator::AverageRate(g) => g.generated_durations(),
            SeriesGenerator::PeriodTotal(g) => g.generated_durations(),
        }
    }
}

pub(crate) fn ensure_ordered(
    previous: Option<&NormalizedSample>,
    current: &NormalizedSample,
) -> Result<()> {
    match previous {
        Some(previous) if current.normalized_timestamp < previous.normalized_timestamp => {
            Err(SeriesError::OutOfOrder {
                previous: previous.normalized_timestamp,
                current: current.normalized_timestamp,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed_point::FixedPoint;
    use crate::core::sample::RegisterSample;
    use crate::core::units::Unit;
    use chrono::{Duration, TimeZone, Utc};

    fn wh(hour: i64, raw: i64, device: &str) -> NormalizedSample {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::hours(hour);
        NormalizedSample::new(
            RegisterSample::new(ts, FixedPoint::new(raw, 0), Unit::WattHour, device),
            ts,
        )
    }

    #[test]
    fn test_kind_roundtrip() {
        let table = Arc::new(WraparoundTable::with_defaults());
        for kind in [
            GeneratorKind::Delta,
            GeneratorKind::AverageRate,
            GeneratorKind::PeriodTotal,
        ] {
            assert_eq!(SeriesGenerator::new(kind, table.clone()).kind(), kind);
        }

        let parsed: GeneratorKind = serde_json::from_str("\"average_rate\"").unwrap();
        assert_eq!(parsed, GeneratorKind::AverageRate);
    }

    #[test]
    fn test_every_kind_emits_one_interval_per_sample() {
        let table = Arc::new(WraparoundTable::with_defaults());
        let samples = vec![wh(0, 100, "A"), wh(1, 150, "A"), wh(2, 10, "B")];

        for kind in [
            GeneratorKind::Delta,
            GeneratorKind::AverageRate,
            GeneratorKind::PeriodTotal,
        ] {
            let mut generator = SeriesGenerator::new(kind, table.clone());
            generator.feed(samples.clone()).unwrap();
            assert_eq!(generator.generated_durations().len(), samples.len());
        }
    }

    #[test]
    fn test_every_kind_rejects_out_of_order_samples() {
        let table = Arc::new(WraparoundTable::with_defaults());

        for kind in [
            GeneratorKind::Delta,
            GeneratorKind::AverageRate,
            GeneratorKind::PeriodTotal,
        ] {
            let mut generator = SeriesGenerator::new(kind, table.clone());
            generator.calculate_next(wh(2, 100, "A")).unwrap();
            let err = generator.calculate_next(wh(1, 120, "A")).unwrap_err();
            assert!(matches!(err, SeriesError::OutOfOrder { .. }));
            assert_eq!(generator.generated_durations().len(), 1);
        }
    }

    #[test]
    fn test_equal_timestamps_are_accepted() {
        let table = Arc::new(WraparoundTable::with_defaults());
        let mut generator = SeriesGenerator::new(GeneratorKind::Delta, table);
        generator.calculate_next(wh(1, 100, "A")).unwrap();
        generator.calculate_next(wh(1, 100, "A")).unwrap();
        assert_eq!(generator.into_generated().len(), 2);
    }
}
