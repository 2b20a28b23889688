pub mod unit_record;
pub mod output_row;
pub mod export_summary;

pub use unit_record::UnitRecord;
pub use output_row::OutputRow;
pub use export_summary::{ExportSummary, ProductFailure};
