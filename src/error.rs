/// Error types for the export pipeline
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while exporting product units
#[derive(Debug, Error)]
pub enum ExportError {
    /// No bearer token could be resolved
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input file is missing, unreadable or holds no product numbers
    #[error("Input error ({}): {reason}", .path.display())]
    Input {
        path: PathBuf,
        reason: String,
    },

    /// The API answered with a non-success status
    #[error("HTTP {status} for product '{product}'. Response: {body}")]
    Fetch {
        product: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connect failure, timeout)
    #[error("Network error for product '{product}': {reason}")]
    Network {
        product: String,
        reason: String,
    },

    /// The response body was not valid JSON
    #[error("Invalid JSON for product '{product}': {reason}")]
    Parse {
        product: String,
        reason: String,
    },

    /// The result file could not be created or written
    #[error("Output error ({}): {reason}", .path.display())]
    Output {
        path: PathBuf,
        reason: String,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

impl ExportError {
    /// Whether the error belongs to a single product and should not abort the run.
    pub fn is_per_product(&self) -> bool {
        matches!(
            self,
            ExportError::Fetch { .. } | ExportError::Network { .. } | ExportError::Parse { .. }
        )
    }

    /// Product number the error refers to, if any.
    pub fn product(&self) -> Option<&str> {
        match self {
            ExportError::Fetch { product, .. }
            | ExportError::Network { product, .. }
            | ExportError::Parse { product, .. } => Some(product),
            _ => None,
        }
    }
}
