use std::path::PathBuf;

/// A product whose lookup failed, with the reason as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFailure {
    pub product: String,
    pub reason: String,
}

/// Outcome of a completed export run.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub products_processed: usize,
    pub rows_written: usize,
    pub failures: Vec<ProductFailure>,
    pub output_path: PathBuf,
}

impl ExportSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
