// JSON utilities
pub mod json_converter;

// URL handling utilities
pub mod query_string;

// Re-export all utilities for convenient access
pub use json_converter::value_to_cell;
pub use query_string::build_query_string;
