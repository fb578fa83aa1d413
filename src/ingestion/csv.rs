//! CSV extraction.

use std::path::Path;

use crate::error::{EtlError, EtlResult};
use crate::types::{normalize_header, RawRow, RawValue};

/// Extract a CSV file into [`RawRow`]s.
///
/// Rules:
///
/// - CSV must have a header row; headers are normalized.
/// - Empty cells become [`RawValue::Null`]; everything else stays text.
/// - A record shorter than the header has its missing trailing cells read as [`RawValue::Null`].
/// - A record longer than the header, or one that is not valid UTF-8, is a file-level error.
/// - Rows that are blank across all columns are dropped.
pub fn extract_csv_from_path(path: impl AsRef<Path>) -> EtlResult<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;
    extract_csv_from_reader(&mut rdr)
}

/// Extract CSV data from an existing CSV reader.
///
/// Short records are only accepted when `rdr` was built with `flexible(true)`.
pub fn extract_csv_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> EtlResult<Vec<RawRow>> {
    let headers: Vec<String> = rdr.headers()?.iter().map(normalize_header).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, csv::Position::line);
            return Err(EtlError::UnsupportedFormat {
                message: format!(
                    "line {line}: expected {} fields, saw {}",
                    headers.len(),
                    record.len()
                ),
            });
        }
        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), record.get(i).map_or(RawValue::Null, cell_value)))
            .collect();
        if !row.is_empty() {
            rows.push(row);
        }
    }

    Ok(rows)
}

fn cell_value(raw: &str) -> RawValue {
    if raw.trim().is_empty() {
        RawValue::Null
    } else {
        RawValue::Text(raw.to_owned())
    }
}
