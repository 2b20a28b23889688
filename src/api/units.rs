use serde_json::Value;
use urlencoding::encode;

use super::client::RackbeatClient;
use crate::error::ExportError;
use crate::models::UnitRecord;
use crate::utils::value_to_cell;

/// Fields requested from the units endpoint.
pub const UNIT_FIELDS: &str = "unit,name,quantity";

/// Object keys that may wrap the unit array, checked in order.
const WRAPPER_KEYS: &[&str] = &["item_units", "data", "units", "results", "items"];

impl RackbeatClient {
    /// Load the unit-of-measure records of one product.
    ///
    /// No retry is attempted; a failure is returned to the caller as-is.
    pub async fn fetch_units(&self, product: &str) -> Result<Vec<UnitRecord>, ExportError> {
        let endpoint = units_endpoint(product);
        let payload = self
            .get_json(product, &endpoint, &[("fields", UNIT_FIELDS)])
            .await?;
        let units = parse_units_payload(&payload);
        tracing::debug!(product, count = units.len(), "Parsed units");
        Ok(units)
    }
}

/// Path of the units endpoint for `product`, relative to the API base.
pub fn units_endpoint(product: &str) -> String {
    format!("/products/{}/units", encode(product))
}

/// Extract unit records from a decoded response.
///
/// Accepts a bare array or an object wrapping the array under one of the
/// known keys. Non-object elements are ignored, and any other shape yields
/// no units.
pub fn parse_units_payload(payload: &Value) -> Vec<UnitRecord> {
    let items = match payload {
        Value::Array(arr) => Some(arr),
        Value::Object(obj) => WRAPPER_KEYS
            .iter()
            .find_map(|key| obj.get(*key).and_then(|v| v.as_array())),
        _ => None,
    };

    items
        .map(|arr| {
            arr.iter()
                .filter_map(|item| item.as_object())
                .map(|obj| {
                    let field = |key: &str| obj.get(key).map(value_to_cell).unwrap_or_default();
                    UnitRecord {
                        unit: field("unit"),
                        unit_name: field("name"),
                        quantity: field("quantity"),
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}
