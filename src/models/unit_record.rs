/// One unit-of-measure entry returned by the API for a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub unit: String,
    pub unit_name: String,
    pub quantity: String,
}
