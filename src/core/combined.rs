// Signed sum of several aligned derived series

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::core::error::{Result, SeriesError};
use crate::core::generator::MultiInputSeriesGenerator;
use crate::core::interval::DerivedInterval;
use crate::core::series_key::SeriesKey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    #[default]
    Plus,
    Minus,
}

impl Sign {
    pub fn factor(self) -> f64 {
        match self {
            Sign::Plus => 1.0,
            Sign::Minus => -1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub key: SeriesKey,
    #[serde(default)]
    pub sign: Sign,
}

impl Term {
    pub fn plus(key: SeriesKey) -> Self {
        Self {
            key,
            sign: Sign::Plus,
        }
    }

    pub fn minus(key: SeriesKey) -> Self {
        Self {
            key,
            sign: Sign::Minus,
        }
    }
}

/// Emits `Σ sign_i * input_i` for every aligned slot, e.g. grid import plus
/// solar yield minus export.
#[derive(Debug, Clone)]
pub struct CombinedGenerator {
    terms: Vec<Term>,
    generated: Vec<DerivedInterval>,
}

impl CombinedGenerator {
    pub fn new(terms: Vec<Term>) -> Self {
        Self {
            terms,
            generated: Vec::new(),
        }
    }

    pub fn required_keys(&self) -> impl Iterator<Item = &SeriesKey> {
        self.terms.iter().map(|term| &term.key)
    }

    pub fn into_generated(self) -> Vec<DerivedInterval> {
        self.generated
    }
}

impl MultiInputSeriesGenerator for CombinedGenerator {
    fn is_satisfied_by(&self, available: &HashMap<SeriesKey, Vec<DerivedInterval>>) -> bool {
        !self.terms.is_empty()
            && self.required_keys().all(|key| {
                available
                    .get(key)
                    .map_or(false, |intervals| !intervals.is_empty())
            })
    }

    fn calculate_next(&mut self, samples: &HashMap<SeriesKey, DerivedInterval>) -> Result<()> {
        let missing: Vec<SeriesKey> = self
            .required_keys()
            .filter(|key| !samples.contains_key(*key))
            .cloned()
            .collect();

        let (first, rest) = match self.terms.split_first() {
            Some(split) if missing.is_empty() => split,
            _ => return Err(SeriesError::UnsatisfiedInputs { missing }),
        };

        let lead = &samples[&first.key];
        let mut combined = DerivedInterval {
            value: first.sign.factor() * lead.value,
            ..lead.clone()
        };

        for term in rest {
            let interval = &samples[&term.key];
            if interval.normalized_end != lead.normalized_end {
                return Err(SeriesError::MisalignedInputs {
                    expected: lead.normalized_end,
                    found: interval.normalized_end,
                });
            }
            combined.accumulate(interval, term.sign.factor())?;
        }

        self.generated.push(combined);
        Ok(())
    }

    fn generated(&self) -> &[DerivedInterval] {
        &self.generated
    }
}

/// Groups the intervals of `keys` by normalized end, keeping only slots
/// present in every series. Slots come out in time order; several intervals
/// of one series ending in the same slot are summed.
pub fn aligned_slots<'a, I>(
    available: &HashMap<SeriesKey, Vec<DerivedInterval>>,
    keys: I,
) -> Result<Vec<HashMap<SeriesKey, DerivedInterval>>>
where
    I: IntoIterator<Item = &'a SeriesKey>,
{
    let keys: Vec<&SeriesKey> = keys.into_iter().collect();
    let mut slots: BTreeMap<DateTime<Utc>, HashMap<SeriesKey, DerivedInterval>> =
        BTreeMap::new();

    for key in &keys {
        let Some(intervals) = available.get(*key) else {
            return Ok(Vec::new());
        };
        for interval in intervals {
            let slot = slots.entry(interval.normalized_end).or_default();
            match slot.get_mut(*key) {
                Some(existing) => existing.accumulate(interval, 1.0)?,
                None => {
                    slot.insert((*key).clone(), interval.clone());
                }
            }
        }
    }

    Ok(slots
        .into_values()
        .filter(|slot| keys.iter().all(|key| slot.contains_key(*key)))
        .collect())
}
