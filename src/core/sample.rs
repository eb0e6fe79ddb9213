// Register readings as delivered by the interval grouping stage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::fixed_point::FixedPoint;
use crate::core::units::Unit;

/// One raw meter reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterSample {
    pub timestamp: DateTime<Utc>,
    pub value: FixedPoint,
    pub unit: Unit,
    pub device_id: String,
}

impl RegisterSample {
    pub fn new(
        timestamp: DateTime<Utc>,
        value: FixedPoint,
        unit: Unit,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            value,
            unit,
            device_id: device_id.into(),
        }
    }
}

/// A reading assigned to its canonical interval bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSample {
    #[serde(flatten)]
    pub sample: RegisterSample,
    pub normalized_timestamp: DateTime<Utc>,
}

impl NormalizedSample {
    pub fn new(sample: RegisterSample, normalized_timestamp: DateTime<Utc>) -> Self {
        Self {
            sample,
            normalized_timestamp,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.sample.device_id
    }

    pub fn unit(&self) -> &Unit {
        &self.sample.unit
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.sample.timestamp
    }

    pub fn same_lineage(&self, other: &NormalizedSample) -> bool {
        self.sample.device_id == other.sample.device_id
    }
}
