// Error handling for the series derivation engine

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::series_key::SeriesKey;
use crate::core::units::Unit;

pub type Result<T> = std::result::Result<T, SeriesError>;

#[derive(Error, Debug)]
pub enum SeriesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unit mismatch: expected {expected}, found {found}")]
    UnitMismatch { expected: Unit, found: Unit },

    #[error("Cannot subtract {subtrahend} from {minuend}")]
    IncompatibleUnits { minuend: Unit, subtrahend: Unit },

    #[error("Sample out of order: {current} is before {previous}")]
    OutOfOrder {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    #[error("Missing generator inputs: {missing:?}")]
    UnsatisfiedInputs { missing: Vec<SeriesKey> },

    #[error("Misaligned inputs: expected slot {expected}, found {found}")]
    MisalignedInputs {
        expected: DateTime<Utc>,
        found: DateTime<Utc>,
    },

    #[error("Cannot sum an empty set of intervals")]
    EmptySum,

    #[error("Rescaling {raw} from scale {from} to {to} overflows")]
    ScaleOverflow { raw: i64, from: u32, to: u32 },
}
