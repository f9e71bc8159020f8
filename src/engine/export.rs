//! Fixed-layout timesheet and summary sheets.
//!
//! Downstream spreadsheets address columns by header text and position, so
//! every column below is always written, blank when the source has no value.

use std::io;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

use super::normalizer::{NormalizedBatch, NormalizedRow};
use crate::model::payroll::PayrollSummary;

/// Header text of the timesheet sheet, in column order. Some headers carry a
/// trailing space and must be kept that way.
pub const TIMESHEET_COLUMNS: [&str; 12] = [
    "Name",
    "Date",
    "Month ",
    "Year ",
    "Day ",
    "Check In",
    "Check Out",
    "Working Hrs.",
    "Work Hours",
    "OT",
    "Remark ",
    "Absent ",
];

enum Source {
    Field(&'static str),
    WorkedHours,
    Overtime,
}

const LAYOUT: [Source; 12] = [
    Source::Field("name"),
    Source::Field("date_val"),
    Source::Field("month_val"),
    Source::Field("year_val"),
    Source::Field("day_val"),
    Source::Field("check_in"),
    Source::Field("check_out"),
    Source::WorkedHours,
    Source::Field("work_hours"),
    Source::Overtime,
    Source::Field("remark"),
    Source::Field("absent"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Display, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sheet {
    #[default]
    Timesheet,
    Summary,
}

/// One timesheet line, cells in [`TIMESHEET_COLUMNS`] order.
pub type ExportRow = Vec<String>;

pub fn timesheet_rows(batch: &NormalizedBatch) -> Vec<ExportRow> {
    batch.rows.iter().map(timesheet_row).collect()
}

fn timesheet_row(row: &NormalizedRow) -> ExportRow {
    LAYOUT
        .iter()
        .zip(TIMESHEET_COLUMNS)
        .map(|(source, header)| match source {
            Source::WorkedHours => render_value(&Value::from(row.worked_hours)),
            Source::Overtime => render_value(&Value::from(row.overtime_hours)),
            // a sheet already in export layout passes its own column through
            Source::Field(field) => row
                .fields
                .get(*field)
                .or_else(|| row.fields.get(header))
                .map(render_value)
                .unwrap_or_default(),
        })
        .collect()
}

/// Cell text of a raw value: strings verbatim, numbers in JSON notation,
/// null as blank.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The single row of the summary sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRecord {
    #[serde(rename = "Employee")]
    pub employee: String,
    #[serde(rename = "Base Monthly Salary")]
    pub monthly_salary: f64,
    #[serde(rename = "Actual Worked Hours")]
    pub total_worked_hours: f64,
    #[serde(rename = "Total OT Hours")]
    pub total_overtime_hours: f64,
    #[serde(rename = "Contracted Hours")]
    pub contracted_hours: f64,
    #[serde(rename = "Per Hour Salary")]
    pub per_hour_rate: f64,
    #[serde(rename = "Leave Deduction")]
    pub leave_deduction: f64,
    #[serde(rename = "Tax Deduction")]
    pub tax_deduction: f64,
    #[serde(rename = "Security Deposit Deduction")]
    pub deposit_deduction: f64,
    #[serde(rename = "Total Deductions")]
    pub total_deductions: f64,
    #[serde(rename = "OT Mode")]
    pub overtime_mode: String,
    #[serde(rename = "OT Rate")]
    pub overtime_rate: f64,
    #[serde(rename = "Total OT Pay")]
    pub overtime_pay: f64,
    #[serde(rename = "Final Payable Salary")]
    pub final_payable: f64,
    #[serde(rename = "Attended Days")]
    pub attended_days: usize,
    #[serde(rename = "Tax Month")]
    pub tax_month: String,
    #[serde(rename = "Unparsed Hour Values")]
    pub parse_failures: usize,
}

impl From<&PayrollSummary> for SummaryRecord {
    fn from(s: &PayrollSummary) -> Self {
        Self {
            employee: s.employee.clone(),
            monthly_salary: s.monthly_salary,
            total_worked_hours: s.total_worked_hours,
            total_overtime_hours: s.total_overtime_hours,
            contracted_hours: s.contracted_hours,
            per_hour_rate: s.per_hour_rate,
            leave_deduction: s.leave_deduction,
            tax_deduction: s.tax_deduction,
            deposit_deduction: s.deposit_deduction,
            total_deductions: s.total_deductions,
            overtime_mode: s.overtime_policy.mode().to_string(),
            overtime_rate: s.overtime_rate,
            overtime_pay: s.overtime_pay,
            final_payable: s.final_payable,
            attended_days: s.attended_days,
            tax_month: s.tax_month.clone().unwrap_or_default(),
            parse_failures: s.parse_failures,
        }
    }
}

pub fn write_timesheet<W: io::Write>(batch: &NormalizedBatch, writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(TIMESHEET_COLUMNS)?;
    for row in timesheet_rows(batch) {
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_summary<W: io::Write>(summary: &PayrollSummary, writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.serialize(SummaryRecord::from(summary))?;
    wtr.flush()?;
    Ok(())
}

/// `KINIHARA_Timesheet_<employee>_<YYYY-MM-DD_HHMM>_<sheet>.csv`
pub fn export_file_name(employee: &str, sheet: Sheet, at: NaiveDateTime) -> String {
    let employee: String = employee
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!(
        "KINIHARA_Timesheet_{}_{}_{}.csv",
        employee,
        at.format("%Y-%m-%d_%H%M"),
        sheet
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calculator::OvertimePolicy;
    use crate::engine::normalizer::{AttendanceNormalizer, RawRow};
    use chrono::NaiveDate;
    use serde_json::json;

    fn rows(values: Vec<Value>) -> Vec<RawRow> {
        values
            .into_iter()
            .map(|v| match v {
                Value::Object(map) => map,
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn store_rows_fill_every_column() {
        let batch = AttendanceNormalizer::new(8.0).normalize(rows(vec![json!({
            "name": "Om",
            "date_val": "2026-01-05",
            "month_val": "January",
            "year_val": "2026",
            "day_val": "Monday",
            "check_in": "09:00:00",
            "check_out": "19:00:00",
            "work_hours": 10.0,
            "ot_hours": null,
            "remark": null,
            "absent": null,
        })]));
        let out = timesheet_rows(&batch);
        assert_eq!(
            out[0],
            vec![
                "Om", "2026-01-05", "January", "2026", "Monday", "09:00:00", "19:00:00", "10.0",
                "10.0", "2.0", "0.0", "0.0"
            ]
        );
    }

    #[test]
    fn absent_columns_are_blank_and_sheet_columns_pass_through() {
        let batch = AttendanceNormalizer::new(8.0).normalize(rows(vec![json!({
            "Name": "External",
            "Worked_Hours": "06:00:00",
        })]));
        let out = timesheet_rows(&batch);
        assert_eq!(out[0].len(), TIMESHEET_COLUMNS.len());
        assert_eq!(out[0][0], "External");
        assert_eq!(out[0][1], "");
        assert_eq!(out[0][7], "6.0");
        assert_eq!(out[0][8], "");
    }

    #[test]
    fn timesheet_csv_starts_with_exact_headers() {
        let batch = AttendanceNormalizer::new(8.0).normalize(rows(vec![json!({ "name": "Om" })]));
        let mut buf = Vec::new();
        write_timesheet(&batch, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let header = text.lines().next().unwrap();
        assert_eq!(
            header,
            "Name,Date,Month ,Year ,Day ,Check In,Check Out,Working Hrs.,Work Hours,OT,Remark ,Absent "
        );
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn summary_csv_has_one_record() {
        let summary = PayrollSummary {
            employee: "Om".into(),
            monthly_salary: 18000.0,
            total_worked_hours: 200.0,
            total_overtime_hours: 0.0,
            contracted_hours: 208.0,
            per_hour_rate: 86.5,
            leave_deduction: 692.0,
            tax_deduction: 200.0,
            deposit_deduction: 0.0,
            total_deductions: 892.0,
            overtime_policy: OvertimePolicy::FixedRate {
                rate_per_hour: 100.0,
            },
            overtime_rate: 100.0,
            overtime_pay: 0.0,
            final_payable: 17108.0,
            attended_days: 25,
            tax_month: None,
            parse_failures: 0,
        };
        let mut buf = Vec::new();
        write_summary(&summary, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Employee,Base Monthly Salary,"));
        assert!(header.contains(",OT Mode,OT Rate,"));
        assert!(lines.next().unwrap().starts_with("Om,18000.0,200.0,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn file_name_is_stamped() {
        let at = NaiveDate::from_ymd_opt(2026, 2, 3)
            .unwrap()
            .and_hms_opt(14, 7, 0)
            .unwrap();
        assert_eq!(
            export_file_name("Om Prakash", Sheet::Summary, at),
            "KINIHARA_Timesheet_Om_Prakash_2026-02-03_1407_summary.csv"
        );
    }
}
