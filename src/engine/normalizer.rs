//! Turns loosely shaped attendance rows into numeric hours.
//!
//! Rows come either from the attendance store or from an uploaded sheet, so
//! column names and value types vary. Hour values that cannot be read are
//! counted as zero and reported through [`NormalizedBatch::parse_failures`]
//! instead of failing the payroll run.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::hours::parse_clock_duration;

/// A raw attendance row: column name to loosely typed value.
pub type RawRow = Map<String, Value>;

/// Recognized names of the worked-hours column, in order of preference.
pub const WORK_HOURS_ALIASES: [&str; 2] = ["work_hours", "Worked_Hours"];

/// Recognized names of the overtime column, in order of preference.
pub const OT_HOURS_ALIASES: [&str; 2] = ["ot_hours", "OT_Hours"];

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    /// Source row with every missing or null value replaced by `0`.
    pub fields: RawRow,
    pub worked_hours: f64,
    /// Effective overtime, see [`AttendanceNormalizer::normalize`].
    pub overtime_hours: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    pub rows: Vec<NormalizedRow>,
    /// Column the worked hours were read from.
    pub work_column: String,
    /// Column the overtime hours were read from.
    pub overtime_column: String,
    pub parse_failures: usize,
}

impl NormalizedBatch {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with their hour columns replaced by the parsed values. Feeding
    /// these back through the normalizer yields the same hours.
    pub fn to_raw_rows(&self) -> Vec<RawRow> {
        self.rows
            .iter()
            .map(|row| {
                let mut fields = row.fields.clone();
                fields.insert(self.work_column.clone(), Value::from(row.worked_hours));
                fields.insert(self.overtime_column.clone(), Value::from(row.overtime_hours));
                fields
            })
            .collect()
    }
}

pub struct AttendanceNormalizer {
    standard_hours_per_day: f64,
}

impl AttendanceNormalizer {
    pub fn new(standard_hours_per_day: f64) -> Self {
        Self {
            standard_hours_per_day,
        }
    }

    /// Normalizes a row set:
    ///
    /// 1. resolves the worked-hours and overtime columns by alias,
    /// 2. fills every missing or null value with `0`,
    /// 3. parses both hour columns leniently and takes absolute values,
    /// 4. derives effective overtime: hours beyond the standard day when the
    ///    shift exceeded it, otherwise the recorded overtime as-is.
    pub fn normalize(&self, rows: Vec<RawRow>) -> NormalizedBatch {
        let work_column = resolve_column(&rows, &WORK_HOURS_ALIASES);
        let overtime_column = resolve_column(&rows, &OT_HOURS_ALIASES);

        let mut columns: BTreeSet<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect();
        columns.insert(work_column.clone());
        columns.insert(overtime_column.clone());

        let mut parse_failures = 0;
        let rows = rows
            .into_iter()
            .map(|mut fields| {
                for column in &columns {
                    let slot = fields.entry(column.clone()).or_insert(Value::Null);
                    if slot.is_null() {
                        *slot = Value::from(0.0);
                    }
                }

                let worked_hours = self.read_hours(&fields, &work_column, &mut parse_failures);
                let recorded_overtime =
                    self.read_hours(&fields, &overtime_column, &mut parse_failures);
                let overtime_hours = if worked_hours > self.standard_hours_per_day {
                    worked_hours - self.standard_hours_per_day
                } else {
                    recorded_overtime
                };

                NormalizedRow {
                    fields,
                    worked_hours,
                    overtime_hours,
                }
            })
            .collect();

        if parse_failures > 0 {
            warn!(parse_failures, "hour values could not be parsed and were counted as 0");
        }

        NormalizedBatch {
            rows,
            work_column,
            overtime_column,
            parse_failures,
        }
    }

    fn read_hours(&self, fields: &RawRow, column: &str, failures: &mut usize) -> f64 {
        let value = fields.get(column).unwrap_or(&Value::Null);
        match parse_hours(value) {
            Some(hours) => hours,
            None => {
                debug!(column, %value, "unparseable hours, counting 0");
                *failures += 1;
                0.0
            }
        }
    }
}

/// Reads one raw value as non-negative hours. `None` means the value was
/// present but unreadable.
pub fn parse_hours(value: &Value) -> Option<f64> {
    let hours = match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if s.trim().is_empty() => 0.0,
        Value::String(s) => parse_clock_duration(s)?,
        Value::Array(_) | Value::Object(_) => return None,
    };
    Some(hours.abs())
}

fn resolve_column(rows: &[RawRow], aliases: &[&str]) -> String {
    aliases
        .iter()
        .find(|alias| rows.iter().any(|row| row.contains_key(**alias)))
        .unwrap_or(&aliases[0])
        .to_string()
}
