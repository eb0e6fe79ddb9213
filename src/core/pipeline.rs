// Batch runner: feeds every configured series and collects the results

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::combined::{aligned_slots, CombinedGenerator, Term};
use crate::core::error::Result;
use crate::core::generator::{
    GeneratorKind, MultiInputSeriesGenerator, SeriesGenerator, SingleInputSeriesGenerator,
};
use crate::core::interval::DerivedInterval;
use crate::core::sample::NormalizedSample;
use crate::core::series_key::SeriesKey;
use crate::core::wraparound::WraparoundTable;

/// One ordered input series as handed over by interval grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesInput {
    #[serde(flatten)]
    pub key: SeriesKey,
    pub samples: Vec<NormalizedSample>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesDefinition {
    pub input: SeriesKey,
    pub kind: GeneratorKind,
    pub output: SeriesKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedDefinition {
    pub output: SeriesKey,
    pub terms: Vec<Term>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesOutput {
    #[serde(flatten)]
    pub key: SeriesKey,
    pub intervals: Vec<DerivedInterval>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesFailure {
    #[serde(flatten)]
    pub key: SeriesKey,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub series: Vec<SeriesOutput>,
    pub failures: Vec<SeriesFailure>,
}

impl BatchReport {
    pub fn get(&self, key: &SeriesKey) -> Option<&[DerivedInterval]> {
        self.series
            .iter()
            .find(|output| &output.key == key)
            .map(|output| output.intervals.as_slice())
    }

    pub fn failed(&self, key: &SeriesKey) -> bool {
        self.failures.iter().any(|failure| &failure.key == key)
    }

    fn fail(&mut self, key: &SeriesKey, reason: String) {
        error!("series {} failed: {}", key, reason);
        self.failures.push(SeriesFailure {
            key: key.clone(),
            reason,
        });
    }
}

/// Runs one generator over a whole ordered sequence.
pub fn derive_series<I>(
    kind: GeneratorKind,
    table: Arc<WraparoundTable>,
    samples: I,
) -> Result<Vec<DerivedInterval>>
where
    I: IntoIterator<Item = NormalizedSample>,
{
    let mut generator = SeriesGenerator::new(kind, table);
    generator.feed(samples)?;
    debug!(
        "{:?} generator produced {} intervals",
        generator.kind(),
        generator.generated_durations().len()
    );
    Ok(generator.into_generated())
}

/// Derives every single-input series in parallel, then the combined series
/// in definition order. A failing series is reported and skipped; it never
/// stops the others.
pub async fn run_batch(
    definitions: &[SeriesDefinition],
    combined: &[CombinedDefinition],
    table: Arc<WraparoundTable>,
    inputs: Vec<SeriesInput>,
) -> BatchReport {
    let mut report = BatchReport::default();

    let inputs: HashMap<SeriesKey, Arc<Vec<NormalizedSample>>> = inputs
        .into_iter()
        .map(|input| (input.key, Arc::new(input.samples)))
        .collect();

    let mut handles: Vec<(&SeriesDefinition, JoinHandle<Result<Vec<DerivedInterval>>>)> =
        Vec::with_capacity(definitions.len());

    for definition in definitions {
        let Some(samples) = inputs.get(&definition.input).cloned() else {
            report.fail(
                &definition.output,
                format!("input series {} not found", definition.input),
            );
            continue;
        };

        let kind = definition.kind;
        let table = table.clone();
        let handle = tokio::task::spawn_blocking(move || {
            derive_series(kind, table, samples.iter().cloned())
        });
        handles.push((definition, handle));
    }

    let mut available: HashMap<SeriesKey, Vec<DerivedInterval>> = HashMap::new();

    for (definition, handle) in handles {
        match handle.await {
            Ok(Ok(intervals)) => {
                info!(
                    "derived {} ({:?}) from {}: {} intervals",
                    definition.output,
                    definition.kind,
                    definition.input,
                    intervals.len()
                );
                publish(&mut report, &mut available, &definition.output, intervals);
            }
            Ok(Err(e)) => report.fail(&definition.output, e.to_string()),
            Err(e) => report.fail(&definition.output, format!("task aborted: {}", e)),
        }
    }

    for definition in combined {
        let mut generator = CombinedGenerator::new(definition.terms.clone());

        if !generator.is_satisfied_by(&available) {
            warn!("inputs for combined series {} unavailable, skipping", definition.output);
            report.fail(&definition.output, "inputs unavailable".to_string());
            continue;
        }

        let fed: Result<()> =
            aligned_slots(&available, generator.required_keys()).and_then(|slots| {
                debug!("combining {} aligned slots into {}", slots.len(), definition.output);
                slots
                    .iter()
                    .try_for_each(|slot| generator.calculate_next(slot))
            });

        match fed {
            Ok(()) => {
                let intervals = generator.into_generated();
                info!("combined {}: {} intervals", definition.output, intervals.len());
                publish(&mut report, &mut available, &definition.output, intervals);
            }
            Err(e) => report.fail(&definition.output, e.to_string()),
        }
    }

    report
}

fn publish(
    report: &mut BatchReport,
    available: &mut HashMap<SeriesKey, Vec<DerivedInterval>>,
    key: &SeriesKey,
    intervals: Vec<DerivedInterval>,
) {
    if available.insert(key.clone(), intervals.clone()).is_some() {
        warn!("series {} produced twice, keeping the latest", key);
        report.series.retain(|output| &output.key != key);
    }
    report.series.push(SeriesOutput {
        key: key.clone(),
        intervals,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed_point::FixedPoint;
    use crate::core::sample::RegisterSample;
    use crate::core::units::Unit;
    use chrono::{Duration, TimeZone, Utc};

    fn samples(device: &str, readings: &[(i64, i64)]) -> Vec<NormalizedSample> {
        let origin = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        readings
            .iter()
            .map(|(hour, raw)| {
                let ts = origin + Duration::hours(*hour);
                NormalizedSample::new(
                    RegisterSample::new(ts, FixedPoint::new(*raw, 0), Unit::WattHour, device),
                    ts,
                )
            })
            .collect()
    }

    fn definition(label: &str, kind: GeneratorKind, code: &str) -> SeriesDefinition {
        SeriesDefinition {
            input: SeriesKey::new(label, "1.8.0"),
            kind,
            output: SeriesKey::new(label, code),
        }
    }

    fn table() -> Arc<WraparoundTable> {
        Arc::new(WraparoundTable::with_defaults())
    }

    #[tokio::test]
    async fn test_failing_series_does_not_block_others() {
        let inputs = vec![
            SeriesInput {
                key: SeriesKey::new("flat-1", "1.8.0"),
                samples: samples("A", &[(0, 100), (1, 130), (2, 190)]),
            },
            SeriesInput {
                key: SeriesKey::new("flat-2", "1.8.0"),
                samples: samples("B", &[(2, 100), (1, 130)]),
            },
        ];
        let definitions = vec![
            definition("flat-1", GeneratorKind::Delta, "delta"),
            definition("flat-2", GeneratorKind::Delta, "delta"),
            definition("flat-3", GeneratorKind::Delta, "delta"),
        ];

        let report = run_batch(&definitions, &[], table(), inputs).await;

        let ok = report.get(&SeriesKey::new("flat-1", "delta")).unwrap();
        assert_eq!(ok.iter().map(|i| i.value).collect::<Vec<_>>(), vec![0.0, 30.0, 60.0]);
        assert!(report.failed(&SeriesKey::new("flat-2", "delta")));
        assert!(report.failed(&SeriesKey::new("flat-3", "delta")));
        assert_eq!(report.series.len(), 1);
    }

    #[tokio::test]
    async fn test_one_input_feeds_several_generators() {
        let inputs = vec![SeriesInput {
            key: SeriesKey::new("flat-1", "1.8.0"),
            samples: samples("A", &[(0, 100), (2, 200)]),
        }];
        let definitions = vec![
            definition("flat-1", GeneratorKind::Delta, "delta"),
            definition("flat-1", GeneratorKind::AverageRate, "power"),
            definition("flat-1", GeneratorKind::PeriodTotal, "total"),
        ];

        let report = run_batch(&definitions, &[], table(), inputs).await;

        assert!(report.failures.is_empty());
        assert_eq!(report.get(&SeriesKey::new("flat-1", "delta")).unwrap()[1].value, 100.0);
        let power = &report.get(&SeriesKey::new("flat-1", "power")).unwrap()[1];
        assert_eq!(power.value, 50.0);
        assert_eq!(power.unit, Unit::Watt);
        assert_eq!(report.get(&SeriesKey::new("flat-1", "total")).unwrap()[1].value, 100.0);
    }

    #[tokio::test]
    async fn test_combined_series_uses_common_slots() {
        let inputs = vec![
            SeriesInput {
                key: SeriesKey::new("import", "1.8.0"),
                samples: samples("M1", &[(0, 0), (1, 400), (2, 900)]),
            },
            SeriesInput {
                key: SeriesKey::new("export", "1.8.0"),
                samples: samples("M2", &[(1, 0), (2, 150)]),
            },
        ];
        let definitions = vec![
            definition("import", GeneratorKind::Delta, "delta"),
            definition("export", GeneratorKind::Delta, "delta"),
        ];
        let combined = vec![CombinedDefinition {
            output: SeriesKey::new("house", "net"),
            terms: vec![
                Term::plus(SeriesKey::new("import", "delta")),
                Term::minus(SeriesKey::new("export", "delta")),
            ],
        }];

        let report = run_batch(&definitions, &combined, table(), inputs).await;

        let net = report.get(&SeriesKey::new("house", "net")).unwrap();
        assert_eq!(net.iter().map(|i| i.value).collect::<Vec<_>>(), vec![400.0, 350.0]);
        assert_eq!(net[1].device_ids, vec!["M1", "M2"]);
    }

    #[tokio::test]
    async fn test_combined_series_keeps_readings_sharing_a_bucket() {
        let origin = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let reading = |minutes: i64, bucket: i64, raw: i64| {
            NormalizedSample::new(
                RegisterSample::new(
                    origin + Duration::minutes(minutes),
                    FixedPoint::new(raw, 0),
                    Unit::WattHour,
                    "M1",
                ),
                origin + Duration::hours(bucket),
            )
        };
        let inputs = vec![SeriesInput {
            key: SeriesKey::new("import", "1.8.0"),
            samples: vec![reading(0, 0, 0), reading(60, 1, 100), reading(90, 1, 150)],
        }];
        let definitions = vec![definition("import", GeneratorKind::Delta, "delta")];
        let combined = vec![CombinedDefinition {
            output: SeriesKey::new("house", "import"),
            terms: vec![Term::plus(SeriesKey::new("import", "delta"))],
        }];

        let report = run_batch(&definitions, &combined, table(), inputs).await;

        let delta_sum: f64 = report
            .get(&SeriesKey::new("import", "delta"))
            .unwrap()
            .iter()
            .map(|i| i.value)
            .sum();
        let combined_sum: f64 = report
            .get(&SeriesKey::new("house", "import"))
            .unwrap()
            .iter()
            .map(|i| i.value)
            .sum();
        assert_eq!(delta_sum, 150.0);
        assert_eq!(combined_sum, 150.0);
    }

    #[tokio::test]
    async fn test_unsatisfied_combined_series_is_reported() {
        let inputs = vec![SeriesInput {
            key: SeriesKey::new("import", "1.8.0"),
            samples: samples("M1", &[(0, 0), (1, 400)]),
        }];
        let definitions = vec![definition("import", GeneratorKind::Delta, "delta")];
        let combined = vec![CombinedDefinition {
            output: SeriesKey::new("house", "net"),
            terms: vec![
                Term::plus(SeriesKey::new("import", "delta")),
                Term::minus(SeriesKey::new("export", "delta")),
            ],
        }];

        let report = run_batch(&definitions, &combined, table(), inputs).await;

        assert!(report.get(&SeriesKey::new("import", "delta")).is_some());
        assert!(report.failed(&SeriesKey::new("house", "net")));
    }

    #[test]
    fn test_report_serializes_flat_keys() {
        let mut report = BatchReport::default();
        report.fail(&SeriesKey::new("flat-9", "delta"), "boom".to_string());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failures"][0]["label"], "flat-9");
        assert_eq!(json["failures"][0]["reason"], "boom");
    }
}
