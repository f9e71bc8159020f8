//! Reads an uploaded CSV or XLSX timesheet into raw rows.

use std::io::{self, Cursor};

use calamine::{Data, Range, Reader, Xlsx};
use chrono::{NaiveDateTime, Timelike};
use serde_json::{Map, Value};

use super::normalizer::RawRow;
use crate::error::IngestError;
use crate::model::attendance::{DATE_FORMAT, TIME_FORMAT};

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Reads an upload of either format. XLSX workbooks are ZIP archives, so the
/// signature decides; anything else is parsed as CSV.
pub fn read_timesheet(bytes: &[u8]) -> Result<Vec<RawRow>, IngestError> {
    if bytes.starts_with(ZIP_SIGNATURE) {
        read_xlsx_rows(bytes)
    } else {
        Ok(read_csv_rows(bytes)?)
    }
}

/// Parses a CSV document with a header row. Header text is kept verbatim.
/// Short records simply lack the trailing columns.
pub fn read_csv_rows<R: io::Read>(reader: R) -> csv::Result<Vec<RawRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), cell_value(cell)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Reads the first worksheet of an XLSX workbook.
pub fn read_xlsx_rows(bytes: &[u8]) -> Result<Vec<RawRow>, IngestError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::NoWorksheet)??;
    Ok(rows_from_range(&range))
}

/// The first row of the used range is the header row.
fn rows_from_range(range: &Range<Data>) -> Vec<RawRow> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<Option<String>> = header_row
        .iter()
        .map(|cell| match cell {
            Data::Empty => None,
            Data::String(s) if s.trim().is_empty() => None,
            Data::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
        .collect();

    rows.filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|cells| {
            headers
                .iter()
                .zip(cells)
                .filter_map(|(header, cell)| {
                    header.as_ref().map(|h| (h.clone(), excel_value(cell)))
                })
                .collect()
        })
        .collect()
}

/// Blank cells are null, numeric cells numbers, anything else text.
fn cell_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::from(n);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::from(n),
        _ => Value::String(cell.to_string()),
    }
}

fn excel_value(cell: &Data) -> Value {
    match cell {
        Data::Int(n) => Value::from(*n),
        Data::Float(f) if f.is_finite() => Value::from(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Value::Null,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::DateTime(dt) if dt.is_duration() => Value::String(clock_text(dt.as_f64() * 24.0)),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|at| Value::String(datetime_text(at, dt.as_f64() < 1.0)))
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Signed hours as `HH:MM:SS`; hours may exceed 24.
fn clock_text(hours: f64) -> String {
    let total = (hours.abs() * 3600.0).round() as i64;
    let sign = if hours < 0.0 && total > 0 { "-" } else { "" };
    format!(
        "{sign}{:02}:{:02}:{:02}",
        total / 3600,
        (total / 60) % 60,
        total % 60
    )
}

fn datetime_text(at: NaiveDateTime, time_only: bool) -> String {
    if time_only {
        at.format(TIME_FORMAT).to_string()
    } else if at.num_seconds_from_midnight() == 0 {
        at.format(DATE_FORMAT).to_string()
    } else {
        at.format(&format!("{DATE_FORMAT} {TIME_FORMAT}")).to_string()
    }
}
