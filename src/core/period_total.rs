// Running total since the start of each device's period

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::core::error::Result;
use crate::core::generator::{ensure_ordered, SingleInputSeriesGenerator};
use crate::core::interval::DerivedInterval;
use crate::core::sample::NormalizedSample;
use crate::core::wraparound::{subtract, WraparoundTable};

/// Orders device lineages by when their reference sample was taken. The
/// ordinal is the reference's position in the reference list, so two
/// lineages opened in the same bucket never share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReferenceKey {
    pub timestamp: DateTime<Utc>,
    pub ordinal: usize,
    pub device_id: String,
}

impl ReferenceKey {
    pub fn of(reference: &NormalizedSample, ordinal: usize) -> Self {
        Self {
            timestamp: reference.normalized_timestamp,
            ordinal,
            device_id: reference.device_id().to_string(),
        }
    }
}

/// References and contributions only ever grow: one entry per device
/// lineage seen, a switch back to an earlier device opens a new lineage.
#[derive(Debug, Clone, Default)]
pub struct PeriodTotalState {
    previous: Option<NormalizedSample>,
    references: Vec<NormalizedSample>,
    contributions: BTreeMap<ReferenceKey, DerivedInterval>,
}

impl PeriodTotalState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn references(&self) -> &[NormalizedSample] {
        &self.references
    }

    pub fn contributions(&self) -> &BTreeMap<ReferenceKey, DerivedInterval> {
        &self.contributions
    }

    pub fn advance(
        &self,
        sample: NormalizedSample,
        table: &WraparoundTable,
    ) -> Result<(PeriodTotalState, DerivedInterval)> {
        ensure_ordered(self.previous.as_ref(), &sample)?;

        let mut references = self.references.clone();
        let reference = match self.references.last() {
            Some(reference) if reference.same_lineage(&sample) => reference.clone(),
            last => {
                if let Some(superseded) = last {
                    debug!(
                        "meter swap {} -> {} at {}, opening new reference",
                        superseded.device_id(),
                        sample.device_id(),
                        sample.normalized_timestamp
                    );
                }
                references.push(sample.clone());
                sample.clone()
            }
        };

        let ordinal = references.len() - 1;
        let contribution = subtract(&sample, &reference, table)?;
        let mut contributions = self.contributions.clone();
        contributions.insert(ReferenceKey::of(&reference, ordinal), contribution);

        let total = DerivedInterval::sum(contributions.values())?;

        Ok((
            PeriodTotalState {
                previous: Some(sample),
                references,
                contributions,
            },
            total,
        ))
    }
}

#[derive(Debug)]
pub struct PeriodTotalGenerator {
    state: PeriodTotalState,
    table: Arc<WraparoundTable>,
    generated: Vec<DerivedInterval>,
}

impl PeriodTotalGenerator {
    pub fn new(table: Arc<WraparoundTable>) -> Self {
        Self {
            state: PeriodTotalState::new(),
            table,
            generated: Vec::new(),
        }
    }

    pub fn state(&self) -> &PeriodTotalState {
        &self.state
    }

    pub fn into_generated(self) -> Vec<DerivedInterval> {
        self.generated
    }
}

impl SingleInputSeriesGenerator for PeriodTotalGenerator {
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
