// Atomic API modules
pub mod client;
pub mod units;

// Re-export commonly used items
pub use client::{set_silent, RackbeatClient};
pub use units::{parse_units_payload, units_endpoint, UNIT_FIELDS};
