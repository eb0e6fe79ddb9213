use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn, Level};

mod models;
mod utils;

use crate::utils::conf_helper::{init_config, load_inputs, DEFAULT_CONFIG_PATH};
use meter_series::run_batch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // === CONFIG ===
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = init_config(&config_path)
        .await
        .with_context(|| format!("loading config {}", config_path))?;

    let table = Arc::new(
        config
            .wraparound_table()
            .context("building register wraparound table")?,
    );
    info!("Register wraparound table: {} entries", table.len());

    // === INPUT ===
    let inputs = load_inputs(&config.input)
        .await
        .with_context(|| format!("loading samples {}", config.input))?;

    let report = run_batch(&config.series, &config.combined, table, inputs).await;

    info!(
        "Batch finished: {} series derived, {} failed",
        report.series.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        warn!("{}: {}", failure.key, failure.reason);
    }

    // === OUTPUT ===
    let json = serde_json::to_string_pretty(&report)?;
    match &config.output {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("writing report {}", path))?;
            info!("Report written to {}", path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
