//! Export Rackbeat unit-of-measure records for a list of product numbers.
//!
//! Product numbers are read from a CSV file, their units are fetched from
//! the Rackbeat API one product at a time, and the flattened rows are
//! written to a semicolon-separated CSV.

pub mod api;
pub mod config;
pub mod error;
pub mod input;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod utils;

pub use error::ExportError;
pub use pipeline::{run_export, ExportSettings};
