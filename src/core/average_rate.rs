// Average rate of change between consecutive samples

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::core::constants::SECONDS_PER_HOUR;
use crate::core::error::Result;
use crate::core::generator::{ensure_ordered, SingleInputSeriesGenerator};
use crate::core::interval::DerivedInterval;
use crate::core::sample::NormalizedSample;
use crate::core::wraparound::{subtract, WraparoundTable};

/// Wall-clock hours between two instants.
///
/// Rates are always per hour, whatever the natural time base of the unit.
pub fn elapsed_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR
}

#[derive(Debug, Clone, Default)]
pub struct AverageRateState {
    previous: Option<NormalizedSample>,
}

impl AverageRateState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<&NormalizedSample> {
        self.previous.as_ref()
    }

    pub fn advance(
        &self,
        sample: NormalizedSample,
        table: &WraparoundTable,
    ) -> Result<(AverageRateState, DerivedInterval)> {
        ensure_ordered(self.previous(), &sample)?;

        let rate_unit = sample.unit().rate_unit();

        let interval = match &self.previous {
            None => DerivedInterval::zero(&sample, &sample, rate_unit),
            Some(previous) if !previous.same_lineage(&sample) => {
                debug!(
                    "device changed {} -> {}, emitting zero rate",
                    previous.device_id(),
                    sample.device_id()
                );
                DerivedInterval::zero(previous, &sample, rate_unit)
            }
            Some(previous) if previous.unit() != sample.unit() => {
                debug!(
                    "unit changed {} -> {} on {}, emitting zero rate",
                    previous.unit(),
                    sample.unit(),
                    sample.device_id()
                );
                DerivedInterval::zero(previous, &sample, rate_unit)
            }
            Some(previous) => {
                let hours = elapsed_hours(previous.timestamp(), sample.timestamp());
                if hours <= 0.0 {
                    DerivedInterval::zero(previous, &sample, rate_unit)
                } else {
                    let delta = subtract(&sample, previous, table)?;
                    DerivedInterval {
                        value: delta.value / hours,
                        unit: rate_unit,
                        ..delta
                    }
                }
            }
        };

        Ok((
            AverageRateState {
                previous: Some(sample),
            },
            interval,
        ))
    }
}

#[derive(Debug)]
pub struct AverageRateGenerator {
    state: AverageRateState,
    table: Arc<WraparoundTable>,
    generated: Vec<DerivedInterval>,
}

impl AverageRateGenerator {
    pub fn new(table: Arc<WraparoundTable>) -> Self {
        Self {
            state: AverageRateState::new(),
            table,
            generated: Vec::new(),
        }
    }

    pub fn into_generated(self) -> Vec<DerivedInterval> {
        self.generated
    }
}

impl SingleInputSeriesGenerator for AverageRateGenerator {
    fn calculate_next(&mut self, sample: NormalizedSample) -> Result<()> {
        let (state, interval) = self.state.advance(sample, &self.table)?;
        self.state = state;
        self.generated.push(interval);
        Ok(())
    }

    fn generated_durations(&self) -> &[DerivedInterval] {
        &self.generated
    }
}
