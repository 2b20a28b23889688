//! End-to-end export: read product numbers, fetch their units one by one,
//! then write every row in a single pass.

use std::path::PathBuf;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::api::RackbeatClient;
use crate::error::ExportError;
use crate::input::read_product_numbers;
use crate::models::{ExportSummary, OutputRow, ProductFailure};
use crate::output::{flatten, write_rows};

/// Everything a run needs, already resolved from flags and environment.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub token: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub api_base_url: String,
    pub timeout: Duration,
    pub show_progress: bool,
}

/// Run the export.
///
/// Input and output failures abort the run. A product whose lookup fails
/// is recorded in the summary and contributes no rows.
pub async fn run_export(settings: &ExportSettings) -> Result<ExportSummary, ExportError> {
    let products = read_product_numbers(&settings.input_path)?;
    let client = RackbeatClient::new(&settings.api_base_url, &settings.token, settings.timeout)?;

    tracing::info!(
        products = products.len(),
        base_url = client.base_url(),
        "Fetching product units"
    );

    let pb = progress_bar(products.len() as u64, settings.show_progress)?;
    let mut rows: Vec<OutputRow> = Vec::new();
    let mut failures: Vec<ProductFailure> = Vec::new();

    for product in &products {
        pb.set_message(product.clone());
        match client.fetch_units(product).await {
            Ok(units) => rows.extend(flatten(product, units)),
            Err(e) if e.is_per_product() => {
                tracing::warn!(product = %product, error = %e, "Skipping product");
                failures.push(ProductFailure {
                    product: e.product().unwrap_or(product).to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let output_path = write_rows(&settings.output_path, &rows)?;

    Ok(ExportSummary {
        products_processed: products.len(),
        rows_written: rows.len(),
        failures,
        output_path,
    })
}

fn progress_bar(len: u64, visible: bool) -> Result<ProgressBar, ExportError> {
    if !visible {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .map_err(|e| ExportError::Config(format!("Failed to set progress style: {}", e)))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}
