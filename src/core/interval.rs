// Derived interval values produced by the generators

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SeriesError};
use crate::core::sample::NormalizedSample;
use crate::core::units::Unit;

/// A computed value spanning two input samples.
///
/// The start of each span is never after its end; constructors order the
/// endpoints of the two samples they are given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedInterval {
    pub actual_start: DateTime<Utc>,
    pub actual_end: DateTime<Utc>,
    pub normalized_start: DateTime<Utc>,
    pub normalized_end: DateTime<Utc>,
    pub value: f64,
    pub unit: Unit,
    pub device_ids: Vec<String>,
}

impl DerivedInterval {
    pub fn between(from: &NormalizedSample, to: &NormalizedSample, value: f64, unit: Unit) -> Self {
        let mut device_ids = Vec::with_capacity(2);
        push_unique(&mut device_ids, from.device_id());
        push_unique(&mut device_ids, to.device_id());

        Self {
            actual_start: from.timestamp().min(to.timestamp()),
            actual_end: from.timestamp().max(to.timestamp()),
            normalized_start: from.normalized_timestamp.min(to.normalized_timestamp),
            normalized_end: from.normalized_timestamp.max(to.normalized_timestamp),
            value,
            unit,
            device_ids,
        }
    }

    pub fn zero(from: &NormalizedSample, to: &NormalizedSample, unit: Unit) -> Self {
        Self::between(from, to, 0.0, unit)
    }

    /// Adds up intervals of one unit into a single interval covering all
    /// their spans. Device ids are concatenated in input order.
    pub fn sum<'a, I>(intervals: I) -> Result<DerivedInterval>
    where
        I: IntoIterator<Item = &'a DerivedInterval>,
    {
        let mut iter = intervals.into_iter();
        let mut total = iter.next().ok_or(SeriesError::EmptySum)?.clone();

        for interval in iter {
            total.accumulate(interval, 1.0)?;
        }

        Ok(total)
    }

    /// Adds `sign * other.value` into this interval and widens the span.
    pub(crate) fn accumulate(&mut self, other: &DerivedInterval, sign: f64) -> Result<()> {
        if other.unit != self.unit {
            return Err(SeriesError::UnitMismatch {
                expected: self.unit.clone(),
                found: other.unit.clone(),
            });
        }

        self.value += sign * other.value;
        self.actual_start = self.actual_start.min(other.actual_start);
        self.actual_end = self.actual_end.max(other.actual_end);
        self.normalized_start = self.normalized_start.min(other.normalized_start);
        self.normalized_end = self.normalized_end.max(other.normalized_end);
        for id in &other.device_ids {
            push_unique(&mut self.device_ids, id);
        }

        Ok(())
    }

    pub fn duration(&self) -> Duration {
        self.actual_end - self.actual_start
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed_point::FixedPoint;
    use crate::core::sample::RegisterSample;
    use chrono::TimeZone;

    fn sample(hour: u32, raw: i64, device: &str) -> NormalizedSample {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap();
        NormalizedSample::new(
            RegisterSample::new(ts, FixedPoint::new(raw, 0), Unit::WattHour, device),
            ts,
        )
    }

    #[test]
    fn test_between_orders_endpoints() {
        let a = sample(3, 10, "A");
        let b = sample(1, 20, "B");
        let interval = DerivedInterval::between(&a, &b, 5.0, Unit::WattHour);
        assert!(interval.actual_start <= interval.actual_end);
        assert!(interval.normalized_start <= interval.normalized_end);
        assert_eq!(interval.device_ids, vec!["A", "B"]);
        assert_eq!(interval.duration(), Duration::hours(2));
    }

    #[test]
    fn test_zero_same_sample_has_one_device() {
        let a = sample(0, 10, "A");
        let interval = DerivedInterval::zero(&a, &a, Unit::WattHour);
        assert!(interval.is_zero());
        assert_eq!(interval.device_ids, vec!["A"]);
    }

    #[test]
    fn test_sum_concatenates_devices_and_spans() {
        let (x0, x1) = (sample(0, 0, "X"), sample(1, 0, "X"));
        let (y0, y1) = (sample(2, 0, "Y"), sample(3, 0, "Y"));
        let first = DerivedInterval::between(&x0, &x1, 50.0, Unit::WattHour);
        let second = DerivedInterval::between(&y0, &y1, 25.0, Unit::WattHour);

        let total = DerivedInterval::sum([&first, &second]).unwrap();
        assert_eq!(total.value, 75.0);
        assert_eq!(total.device_ids, vec!["X", "Y"]);
        assert_eq!(total.actual_start, first.actual_start);
        assert_eq!(total.actual_end, second.actual_end);
    }

    #[test]
    fn test_sum_rejects_unit_mismatch() {
        let first = DerivedInterval::zero(&sample(0, 0, "X"), &sample(1, 0, "X"), Unit::WattHour);
        let second =
            DerivedInterval::zero(&sample(0, 0, "Y"), &sample(1, 0, "Y"), Unit::CubicMetre);

        let err = DerivedInterval::sum([&first, &second]).unwrap_err();
        assert!(matches!(err, SeriesError::UnitMismatch { .. }));
    }

    #[test]
    fn test_sum_of_nothing_is_an_error() {
        let empty: Vec<DerivedInterval> = Vec::new();
        assert!(matches!(
            DerivedInterval::sum(&empty),
            Err(SeriesError::EmptySum)
        ));
    }
}
