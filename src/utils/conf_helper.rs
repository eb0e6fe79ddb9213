use std::sync::OnceLock;
use tokio::fs;
use tracing::info;

use meter_series::{Result, SeriesError, SeriesInput};

use crate::models::engine_config::EngineConfig;

pub const DEFAULT_CONFIG_PATH: &str = "series.json";

static CONFIG_CACHE: OnceLock<EngineConfig> = OnceLock::new();

pub async fn init_config(file_path: &str) -> Result<&'static EngineConfig> {
    let data = fs::read_to_string(file_path).await?;
    let config: EngineConfig = serde_json::from_str(&data)?;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| SeriesError::Config("Config already initialized".to_string()))?;

    let config = get_cached_config()?;
    info!(
        "Config loaded from {}: {} series, {} combined, {} register overrides",
        file_path,
        config.series.len(),
        config.combined.len(),
        config.wraparound.len()
    );

    Ok(config)
}

pub fn get_cached_config() -> Result<&'static EngineConfig> {
    CONFIG_CACHE
        .get()
        .ok_or_else(|| SeriesError::Config("Config not initialized".to_string()))
}

/// Reads the normalized input series handed over by interval grouping.
pub async fn load_inputs(file_path: &str) -> Result<Vec<SeriesInput>> {
    let data = fs::read_to_string(file_path).await?;
    let inputs: Vec<SeriesInput> = serde_json::from_str(&data)?;

    let samples: usize = inputs.iter().map(|input| input.samples.len()).sum();
    info!("Loaded {} series ({} samples) from {}", inputs.len(), samples, file_path);

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_series::{SeriesKey, Unit};

    #[tokio::test]
    async fn test_load_inputs_from_file() {
        let path = std::env::temp_dir().join("meter_series_load_inputs.json");
        let json = r#"[
            {
                "label": "flat-1",
                "code": "1.8.0",
                "samples": [
                    {
                        "timestamp": "2024-01-01T00:03:12Z",
                        "normalized_timestamp": "2024-01-01T00:00:00Z",
                        "value": { "raw": 123456, "scale": 3 },
                        "unit": "kWh",
                        "device_id": "EM-0001"
                    }
                ]
            }
        ]"#;
        fs::write(&path, json).await.unwrap();

        let inputs = load_inputs(path.to_str().unwrap()).await.unwrap();
        assert_eq!(inputs[0].key, SeriesKey::new("flat-1", "1.8.0"));
        let sample = &inputs[0].samples[0];
        assert_eq!(sample.unit(), &Unit::KilowattHour);
        assert_eq!(sample.device_id(), "EM-0001");
        assert_eq!(sample.sample.value.to_f64(), 123.456);

        fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_config_file_is_io_error() {
        let err = init_config("/nonexistent/series.json").await.unwrap_err();
        assert!(matches!(err, SeriesError::Io(_)));
    }
}
