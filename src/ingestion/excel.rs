#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{EtlError, EtlResult};
use crate::types::{normalize_header, RawRow, RawValue};

/// Extract one sheet of an Excel document (`.xlsx`, `.xls`) into [`RawRow`]s.
///
/// Behavior:
/// - Picks `sheet_name` if provided; otherwise uses the first sheet in the workbook
/// - Detects the first non-empty row as the header row and normalizes its cells
/// - Keeps numeric and boolean cells typed; date cells are rendered as ISO text
/// - Drops rows whose cells are all empty
pub fn extract_excel_from_path(path: impl AsRef<Path>, sheet_name: Option<&str>) -> EtlResult<Vec<RawRow>> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet = match sheet_name {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| EtlError::UnsupportedFormat {
                message: "workbook has no sheets".to_string(),
            })?,
    };

    let range = workbook.worksheet_range(&sheet)?;
    Ok(extract_sheet_range(&range))
}

fn extract_sheet_range(range: &calamine::Range<Data>) -> Vec<RawRow> {
    let mut rows_iter = range
        .rows()
        .skip_while(|row| row.iter().all(|c| matches!(c, Data::Empty)));

    // An empty sheet has no header row and therefore no data rows.
    let Some(header_cells) = rows_iter.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_cells
        .iter()
        .map(|c| normalize_header(&cell_to_header_string(c)))
        .collect();

    rows_iter
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(idx, h)| (h.clone(), convert_cell(cells.get(idx).unwrap_or(&Data::Empty))))
                .collect::<RawRow>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

fn cell_to_header_string(c: &Data) -> String {
    match c {
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(f) => f.to_string(),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("{e:?}"),
        Data::Empty => "".to_string(),
    }
}

fn convert_cell(c: &Data) -> RawValue {
    match c {
        Data::Empty | Data::Error(_) => RawValue::Null,
        Data::String(s) if s.trim().is_empty() => RawValue::Null,
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Int(i) => RawValue::Int(*i),
        Data::Float(f) => RawValue::Float(*f),
        Data::Bool(b) => RawValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.time() == chrono::NaiveTime::MIN => {
                RawValue::Text(ndt.format("%Y-%m-%d").to_string())
            }
            Some(ndt) => RawValue::Text(ndt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => RawValue::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
    }
}
