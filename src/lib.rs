// Meter series derivation engine
// Main library entry point

pub mod core;

// Re-export main types
pub use crate::core::average_rate::AverageRateGenerator;
pub use crate::core::combined::{CombinedGenerator, Sign, Term};
pub use crate::core::delta::DeltaGenerator;
pub use crate::core::error::{Result, SeriesError};
pub use crate::core::fixed_point::FixedPoint;
pub use crate::core::generator::{
    GeneratorKind, MultiInputSeriesGenerator, SeriesGenerator, SingleInputSeriesGenerator,
};
pub use crate::core::interval::DerivedInterval;
pub use crate::core::period_total::PeriodTotalGenerator;
pub use crate::core::pipeline::{
    run_batch, BatchReport, CombinedDefinition, SeriesDefinition, SeriesInput,
};
pub use crate::core::sample::{NormalizedSample, RegisterSample};
pub use crate::core::series_key::SeriesKey;
pub use crate::core::units::Unit;
pub use crate::core::wraparound::{subtract, WraparoundEntry, WraparoundTable};
