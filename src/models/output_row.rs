use serde::Serialize;

use super::unit_record::UnitRecord;

/// A unit record joined with the product it was fetched for.
///
/// Field order is the column order of the written CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputRow {
    pub product_number: String,
    pub unit: String,
    pub unitname: String,
    pub quantity: String,
}

impl OutputRow {
    pub fn new(product_number: &str, unit: UnitRecord) -> Self {
        Self {
            product_number: product_number.to_string(),
            unit: unit.unit,
            unitname: unit.unit_name,
            quantity: unit.quantity,
        }
    }
}
