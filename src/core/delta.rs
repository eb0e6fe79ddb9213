// Consumption between consecutive samples

use std::sync::Arc;
use tracing::debug;

use crate::core::error::Result;
use crate::core::generator::{ensure_ordered, SingleInputSeriesGenerator};
use crate::core::interval::DerivedInterval;
use crate::core::sample::NormalizedSample;
use crate::core::wraparound::{subtract, WraparoundTable};

#[derive(Debug, Clone, Default)]
pub struct DeltaState {
    previous: Option<NormalizedSample>,
}

impl DeltaState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> Option<&NormalizedSample> {
        self.previous.as_ref()
    }

    /// Computes the interval for `sample` and the state that follows it.
    ///
    /// The first sample and any device change yield a zero interval; the
    /// sample always becomes the new `previous`.
    pub fn advance(
        &self,
        sample: NormalizedSample,
        table: &WraparoundTable,
    ) -> Result<(DeltaState, DerivedInterval)> {
        ensure_ordered(self.previous(), &sample)?;

        let interval = match &self.previous {
            None => DerivedInterval::zero(&sample, &sample, sample.unit().clone()),
            Some(previous) if !previous.same_lineage(&sample) => {
                debug!(
                    "device changed {} -> {}, emitting zero delta",
                    previous.device_id(),
                    sample.device_id()
                );
                DerivedInterval::zero(previous, &sample, sample.unit().clone())
            }
            Some(previous) => subtract(&sample, previous, table)?,
        };

        Ok((
            DeltaState {
                previous: Some(sample),
            },
            interval,
        ))
    }
}

#[derive(Debug)]
pub struct DeltaGenerator {
    state: DeltaState,
    table: Arc<WraparoundTable>,
    generated: Vec<DerivedInterval>,
}

impl DeltaGenerator {
    pub fn new(table: Arc<WraparoundTable>) -> Self {
        Self {
            state: DeltaState::new(),
            table,
            generated: Vec::new(),
        }
    }

    pub fn into_generated(self) -> Vec<DerivedInterval> {
        self.generated
    }
}

impl SingleInputSeriesGenerator for DeltaGenerator {
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
