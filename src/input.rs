//! Reading product numbers from the input CSV.
//!
//! The delimiter is sniffed from the head of the file, and a header row
//! is detected either by a known column name or by a non-numeric first
//! cell.

use std::path::Path;

use crate::error::ExportError;

/// Number of bytes inspected when sniffing the delimiter.
pub const SNIFF_SAMPLE_BYTES: usize = 4096;

/// Delimiter used when sniffing finds nothing.
pub const FALLBACK_DELIMITER: u8 = b';';

const CANDIDATE_DELIMITERS: [u8; 3] = [b';', b',', b'\t'];

/// Header names that identify the product number column, in priority order.
const PRODUCT_COLUMN_NAMES: &[&str] = &[
    "product_number",
    "productnumber",
    "product no",
    "product_no",
    "product nr",
    "productnr",
    "itemnumber",
    "sku",
    "varenummer",
];

/// Read every product number from `path`, in file order.
///
/// # Errors
///
/// Returns `ExportError::Input` if the file cannot be read, is not UTF-8,
/// or contains no product numbers.
pub fn read_product_numbers(path: &Path) -> Result<Vec<String>, ExportError> {
    let input_error = |reason: String| ExportError::Input {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| input_error(e.to_string()))?;
    let text = String::from_utf8(bytes)
        .map_err(|e| input_error(format!("file is not valid UTF-8: {}", e)))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let products = parse_product_numbers(text);
    if products.is_empty() {
        return Err(input_error("no product numbers found".to_string()));
    }

    tracing::info!(count = products.len(), path = %path.display(), "Read product numbers");
    Ok(products)
}

/// Extract product numbers from CSV text.
pub fn parse_product_numbers(text: &str) -> Vec<String> {
    let delimiter = detect_delimiter(sniff_sample(text));
    tracing::debug!("Sniffed delimiter {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut records = reader
        .records()
        .filter_map(|r| match r {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(%e, "Skipping unreadable input row");
                None
            }
        })
        .filter(|r| r.iter().any(|cell| !cell.is_empty()));

    let Some(first) = records.next() else {
        return Vec::new();
    };

    let (column, first_is_header) = match product_column(&first) {
        Some(idx) => (idx, true),
        None => (0, !is_numeric(first.get(0).unwrap_or(""))),
    };

    let mut products = Vec::new();
    if !first_is_header {
        push_cell(&mut products, &first, column);
    }
    for record in records {
        push_cell(&mut products, &record, column);
    }
    products
}

/// Pick the most likely delimiter for a sample of CSV text.
///
/// A candidate that appears the same non-zero number of times on every
/// line wins; otherwise the most frequent candidate; otherwise `;`.
pub fn detect_delimiter(sample: &str) -> u8 {
    let lines: Vec<&str> = sample.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return FALLBACK_DELIMITER;
    }

    let mut consistent: Option<(u8, usize)> = None;
    let mut most_frequent: Option<(u8, usize)> = None;

    for &candidate in CANDIDATE_DELIMITERS.iter() {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.bytes().filter(|&b| b == candidate).count())
            .collect();
        let total: usize = counts.iter().sum();
        if total == 0 {
            continue;
        }

        let per_line = counts[0];
        if per_line > 0 && counts.iter().all(|&c| c == per_line) {
            if consistent.map_or(true, |(_, best)| per_line > best) {
                consistent = Some((candidate, per_line));
            }
        }
        if most_frequent.map_or(true, |(_, best)| total > best) {
            most_frequent = Some((candidate, total));
        }
    }

    consistent
        .or(most_frequent)
        .map(|(delimiter, _)| delimiter)
        .unwrap_or(FALLBACK_DELIMITER)
}

/// The head of `text` used for sniffing, cut back to whole lines.
fn sniff_sample(text: &str) -> &str {
    if text.len() <= SNIFF_SAMPLE_BYTES {
        return text;
    }
    let mut end = SNIFF_SAMPLE_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let head = &text[..end];
    match head.rfind('\n') {
        Some(idx) => &head[..idx],
        None => head,
    }
}

fn product_column(record: &csv::StringRecord) -> Option<usize> {
    let normalized: Vec<String> = record.iter().map(|c| c.trim().to_lowercase()).collect();
    PRODUCT_COLUMN_NAMES
        .iter()
        .find_map(|name| normalized.iter().position(|cell| cell == name))
}

fn is_numeric(value: &str) -> bool {
    let value = value.trim();
    value.chars().any(|c| c.is_ascii_digit())
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+'))
}

fn push_cell(out: &mut Vec<String>, record: &csv::StringRecord, column: usize) {
    if let Some(value) = record.get(column).map(str::trim).filter(|v| !v.is_empty()) {
        out.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_by_known_name_is_skipped() {
        let products = parse_product_numbers("product_number\n10001\n10002\n");
        assert_eq!(products, vec!["10001", "10002"]);
    }

    #[test]
    fn test_numeric_first_row_is_data() {
        let products = parse_product_numbers("10001\n10002\n10003");
        assert_eq!(products, vec!["10001", "10002", "10003"]);
    }

    #[test]
    fn test_non_numeric_first_cell_is_header() {
        let products = parse_product_numbers("Item\n10001\n");
        assert_eq!(products, vec!["10001"]);
    }

    #[test]
    fn test_known_column_is_selected_among_many() {
        let text = "name,SKU,price\nWidget,A-100,9.95\nGadget,B-200,4.50\n";
        assert_eq!(parse_product_numbers(text), vec!["A-100", "B-200"]);
    }

    #[test]
    fn test_column_priority_follows_known_names() {
        let text = "sku;product_number\nX;10001\nY;10002\n";
        assert_eq!(parse_product_numbers(text), vec!["10001", "10002"]);
    }

    #[test]
    fn test_blank_rows_and_cells_are_skipped() {
        let text = "product_number;name\n10001;a\n\n;b\n  \n10002;c\n;;\n";
        assert_eq!(parse_product_numbers(text), vec!["10001", "10002"]);
    }

    #[test]
    fn test_duplicates_and_order_are_preserved() {
        let text = "product_number\n3\n1\n3\n2\n";
        assert_eq!(parse_product_numbers(text), vec!["3", "1", "3", "2"]);
    }

    #[test]
    fn test_tab_separated_input() {
        let text = "product_number\tunit\n10001\tpcs\n10002\tbox\n";
        assert_eq!(parse_product_numbers(text), vec!["10001", "10002"]);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(parse_product_numbers("").is_empty());
        assert!(parse_product_numbers("product_number\n").is_empty());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b\n1;2\n"), b';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(detect_delimiter("a\tb\n1\t2\n"), b'\t');
        assert_eq!(detect_delimiter("10001\n10002\n"), FALLBACK_DELIMITER);
        assert_eq!(detect_delimiter(""), FALLBACK_DELIMITER);
    }

    #[test]
    fn test_detect_delimiter_prefers_consistent_candidate() {
        // Commas inside the description column vary per line; semicolons do not.
        let sample = "sku;description\n1;red, large, heavy\n2;blue\n";
        assert_eq!(detect_delimiter(sample), b';');
    }

    #[test]
    fn test_sniff_sample_cuts_at_line_boundary() {
        let mut text = String::from("product_number\n");
        while text.len() <= SNIFF_SAMPLE_BYTES {
            text.push_str("1234567\n");
        }
        let sample = sniff_sample(&text);
        assert!(sample.len() <= SNIFF_SAMPLE_BYTES);
        assert!(sample.lines().all(|l| l == "product_number" || l == "1234567"));
    }
}
