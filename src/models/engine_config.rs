use serde::{Deserialize, Serialize};

use meter_series::{
    CombinedDefinition, Result, SeriesDefinition, WraparoundEntry, WraparoundTable,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub input: String,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub wraparound: Vec<WraparoundEntry>,
    #[serde(default)]
    pub series: Vec<SeriesDefinition>,
    #[serde(default)]
    pub combined: Vec<CombinedDefinition>,
}

impl EngineConfig {
    /// Default register widths with the configured entries applied on top.
    pub fn wraparound_table(&self) -> Result<WraparoundTable> {
        let mut table = WraparoundTable::with_defaults();
        table.extend(self.wraparound.iter().cloned())?;
        Ok(table)
    }
}
