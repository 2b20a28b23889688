//! Writing the flattened unit rows as a semicolon-separated CSV.
//!
//! Rows go to a temporary file next to the destination, which is then
//! atomically persisted over it. A writer dropped before `finish()`
//! removes its temporary file.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::Writer;
use tempfile::NamedTempFile;

use crate::error::ExportError;
use crate::models::{OutputRow, UnitRecord};

pub const OUTPUT_DELIMITER: u8 = b';';
pub const OUTPUT_HEADER: [&str; 4] = ["product_number", "unit", "unitname", "quantity"];

/// Join every unit of `product` into an output row.
pub fn flatten(product: &str, units: Vec<UnitRecord>) -> Vec<OutputRow> {
    units
        .into_iter()
        .map(|unit| OutputRow::new(product, unit))
        .collect()
}

/// Write `rows` to `path`, replacing any existing file.
///
/// # Errors
///
/// Returns `ExportError::Output` if the directory cannot be created or the
/// file cannot be written or persisted.
pub fn write_rows(path: &Path, rows: &[OutputRow]) -> Result<PathBuf, ExportError> {
    let mut writer = UnitCsvWriter::new(path)?;
    for row in rows {
        writer.write_row(row)?;
    }
    let path = writer.finish()?;
    tracing::info!(rows = rows.len(), path = %path.display(), "Wrote output file");
    Ok(path)
}

/// Atomic CSV writer for output rows.
pub struct UnitCsvWriter {
    writer: Writer<BufWriter<NamedTempFile>>,
    final_path: PathBuf,
}

impl UnitCsvWriter {
    /// Create the writer and emit the header row.
    pub fn new(final_path: impl AsRef<Path>) -> Result<Self, ExportError> {
        let final_path = final_path.as_ref().to_path_buf();
        let output_error = |reason: String| ExportError::Output {
            path: final_path.clone(),
            reason,
        };

        let parent_dir = match final_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent_dir)
            .map_err(|e| output_error(format!("Failed to create directory: {}", e)))?;

        let temp_file = temp_file_builder()
            .tempfile_in(&parent_dir)
            .map_err(|e| output_error(format!("Failed to create temporary file: {}", e)))?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(OUTPUT_DELIMITER)
            .terminator(csv::Terminator::CRLF)
            .quote_style(csv::QuoteStyle::Necessary)
            .has_headers(false)
            .from_writer(BufWriter::new(temp_file));

        writer
            .write_record(OUTPUT_HEADER)
            .map_err(|e| output_error(format!("Failed to write header: {}", e)))?;

        Ok(Self { writer, final_path })
    }

    pub fn write_row(&mut self, row: &OutputRow) -> Result<(), ExportError> {
        self.writer
            .serialize(row)
            .map_err(|e| ExportError::Output {
                path: self.final_path.clone(),
                reason: format!("Failed to write row: {}", e),
            })
    }

    /// Flush everything and atomically move the file into place.
    pub fn finish(self) -> Result<PathBuf, ExportError> {
        let final_path = self.final_path;
        let output_error = |reason: String| ExportError::Output {
            path: final_path.clone(),
            reason,
        };

        let buf_writer = self
            .writer
            .into_inner()
            .map_err(|e| output_error(format!("Failed to flush CSV writer: {}", e.error())))?;
        let named_temp = buf_writer
            .into_inner()
            .map_err(|e| output_error(format!("Failed to flush buffer: {}", e.error())))?;

        // An overwritten file keeps its mode; a new one gets the umask default.
        if let Ok(existing) = std::fs::metadata(&final_path) {
            std::fs::set_permissions(named_temp.path(), existing.permissions())
                .map_err(|e| output_error(format!("Failed to copy file mode: {}", e)))?;
        }

        named_temp
            .persist(&final_path)
            .map_err(|e| output_error(format!("Failed to persist file: {}", e.error)))?;

        Ok(final_path)
    }
}

/// Temp files are created like a plain `File::create` would, so the umask applies.
fn temp_file_builder() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".product_units").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    builder
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn row(product: &str, unit: &str, name: &str, quantity: &str) -> OutputRow {
        OutputRow {
            product_number: product.into(),
            unit: unit.into(),
            unitname: name.into(),
            quantity: quantity.into(),
        }
    }

    #[test]
    fn test_header_and_rows() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("out.csv");

        let rows = vec![row("10001", "pcs", "Piece", "1"), row("10001", "box", "Box", "12")];
        let written = write_rows(&path, &rows).expect("Failed to write rows");

        assert_eq!(written, path);
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "product_number;unit;unitname;quantity\r\n10001;pcs;Piece;1\r\n10001;box;Box;12\r\n"
        );
    }

    #[test]
    fn test_empty_rows_still_write_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        write_rows(&path, &[]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "product_number;unit;unitname;quantity\r\n"
        );
    }

    #[test]
    fn test_delimiter_in_field_is_quoted() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        write_rows(&path, &[row("1", "pcs", "Piece; loose", "1")]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("1;pcs;\"Piece; loose\";1\r\n"));
    }

    #[test]
    fn test_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        fs::write(&path, "stale content that is longer than the new file\n").unwrap();

        write_rows(&path, &[]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "product_number;unit;unitname;quantity\r\n"
        );
    }

    #[test]
    fn test_creates_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("deeper").join("out.csv");
        write_rows(&path, &[row("1", "pcs", "Piece", "1")]).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_destination_is_output_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not_a_dir");
        fs::write(&blocker, "file").unwrap();

        let err = write_rows(&blocker.join("out.csv"), &[]).unwrap_err();
        assert!(matches!(err, ExportError::Output { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_overwrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        fs::write(&path, "old\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        write_rows(&path, &[row("1", "pcs", "Piece", "1")]).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();
        write_rows(&path, &[]).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_gets_default_create_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let reference = temp_dir.path().join("reference.csv");
        fs::File::create(&reference).unwrap();
        let expected = fs::metadata(&reference).unwrap().permissions().mode() & 0o777;

        let path = temp_dir.path().join("fresh.csv");
        write_rows(&path, &[]).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, expected);
    }

    #[test]
    fn test_dropped_writer_leaves_no_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        {
            let mut writer = UnitCsvWriter::new(&path).unwrap();
            writer.write_row(&row("1", "pcs", "Piece", "1")).unwrap();
        }
        assert!(!path.exists());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_flatten_keeps_unit_order() {
        let units = vec![
            UnitRecord { unit: "pcs".into(), unit_name: "Piece".into(), quantity: "1".into() },
            UnitRecord { unit: "box".into(), unit_name: "Box".into(), quantity: "6".into() },
        ];
        assert_eq!(
            flatten("42", units),
            vec![row("42", "pcs", "Piece", "1"), row("42", "box", "Box", "6")]
        );
        assert!(flatten("42", Vec::new()).is_empty());
    }
}
