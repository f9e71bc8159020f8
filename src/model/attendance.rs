use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::engine::normalizer::RawRow;

/// Remark written on shifts closed by the next check-in.
pub const AUTO_CHECKOUT_REMARK: &str = "Auto-checkout (Forgot)";

/// Time-of-day format used for check-in / check-out values.
pub const TIME_FORMAT: &str = "%H:%M:%S";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One attendance row. Times stay textual so edited or legacy values
/// survive a round trip through the store untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Om")]
    pub name: String,

    #[schema(example = "2026-02-03", value_type = String, format = "date")]
    pub date_val: NaiveDate,

    #[schema(example = "February")]
    pub month_val: String,

    #[schema(example = "2026")]
    pub year_val: String,

    #[schema(example = "Tuesday")]
    pub day_val: String,

    #[schema(example = "09:00:00", nullable = true)]
    pub check_in: Option<String>,

    #[schema(example = "18:00:00", nullable = true)]
    pub check_out: Option<String>,

    #[schema(example = 9.0, nullable = true)]
    pub work_hours: Option<f64>,

    #[schema(example = 1.0, nullable = true)]
    pub ot_hours: Option<f64>,

    #[schema(nullable = true)]
    pub remark: Option<String>,

    #[schema(nullable = true)]
    pub absent: Option<String>,
}

impl AttendanceRecord {
    /// Flattens the record into the loosely typed row shape the normalizer
    /// consumes. Absent values become `null`.
    pub fn to_raw_row(&self) -> RawRow {
        fn opt_text(v: &Option<String>) -> Value {
            v.clone().map(Value::String).unwrap_or(Value::Null)
        }
        fn opt_num(v: Option<f64>) -> Value {
            v.and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        }

        let mut row = Map::new();
        row.insert("id".into(), Value::from(self.id));
        row.insert("name".into(), Value::String(self.name.clone()));
        row.insert(
            "date_val".into(),
            Value::String(self.date_val.format(DATE_FORMAT).to_string()),
        );
        row.insert("month_val".into(), Value::String(self.month_val.clone()));
        row.insert("year_val".into(), Value::String(self.year_val.clone()));
        row.insert("day_val".into(), Value::String(self.day_val.clone()));
        row.insert("check_in".into(), opt_text(&self.check_in));
        row.insert("check_out".into(), opt_text(&self.check_out));
        row.insert("work_hours".into(), opt_num(self.work_hours));
        row.insert("ot_hours".into(), opt_num(self.ot_hours));
        row.insert("remark".into(), opt_text(&self.remark));
        row.insert("absent".into(), opt_text(&self.absent));
        row
    }
}

/// Row inserted by a check-in.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendance {
    pub name: String,
    pub date_val: NaiveDate,
    pub month_val: String,
    pub year_val: String,
    pub day_val: String,
    pub check_in: String,
}

impl NewAttendance {
    /// Derives the calendar labels (`February`, `2026`, `Tuesday`) from the
    /// moment of check-in.
    pub fn opened_at(name: &str, now: NaiveDateTime) -> Self {
        Self {
            name: name.to_string(),
            date_val: now.date(),
            month_val: now.format("%B").to_string(),
            year_val: now.format("%Y").to_string(),
            day_val: now.format("%A").to_string(),
            check_in: now.format(TIME_FORMAT).to_string(),
        }
    }
}

/// Partial update of an attendance row. `None` leaves a column untouched,
/// `Some(None)` on a nullable column clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendancePatch {
    pub check_in: Option<Option<String>>,
    pub check_out: Option<Option<String>>,
    pub work_hours: Option<f64>,
    pub ot_hours: Option<Option<f64>>,
    pub remark: Option<Option<String>>,
    pub absent: Option<Option<String>>,
}

impl AttendancePatch {
    /// Applies the patch to an in-memory record.
    pub fn apply(&self, record: &mut AttendanceRecord) {
        if let Some(v) = &self.check_in {
            record.check_in = v.clone();
        }
        if let Some(v) = &self.check_out {
            record.check_out = v.clone();
        }
        if let Some(v) = self.work_hours {
            record.work_hours = Some(v);
        }
        if let Some(v) = self.ot_hours {
            record.ot_hours = v;
        }
        if let Some(v) = &self.remark {
            record.remark = v.clone();
        }
        if let Some(v) = &self.absent {
            record.absent = v.clone();
        }
    }
}

/// Optional month / year window used when listing records.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct Period {
    #[schema(example = "February")]
    pub month: Option<String>,
    #[schema(example = "2026")]
    pub year: Option<String>,
}

impl Period {
    pub fn contains(&self, record: &AttendanceRecord) -> bool {
        let month_ok = self
            .month
            .as_deref()
            .is_none_or(|m| m.trim().eq_ignore_ascii_case(record.month_val.trim()));
        let year_ok = self
            .year
            .as_deref()
            .is_none_or(|y| y.trim() == record.year_val.trim());
        month_ok && year_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opened_at_derives_calendar_labels() {
        let now = NaiveDate::from_ymd_opt(2026, 2, 3)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap();
        let row = NewAttendance::opened_at("Om", now);
        assert_eq!(row.month_val, "February");
        assert_eq!(row.year_val, "2026");
        assert_eq!(row.day_val, "Tuesday");
        assert_eq!(row.check_in, "09:05:07");
    }

    #[test]
    fn raw_row_keeps_nulls_for_open_shift() {
        let record = AttendanceRecord {
            id: 4,
            name: "Om".into(),
            date_val: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            month_val: "February".into(),
            year_val: "2026".into(),
            day_val: "Tuesday".into(),
            check_in: Some("09:00:00".into()),
            check_out: None,
            work_hours: None,
            ot_hours: None,
            remark: None,
            absent: None,
        };
        let row = record.to_raw_row();
        assert_eq!(row["date_val"], Value::String("2026-02-03".into()));
        assert_eq!(row["check_out"], Value::Null);
        assert_eq!(row["work_hours"], Value::Null);
    }

    #[test]
    fn period_matches_month_case_insensitively() {
        let record = AttendanceRecord {
            id: 1,
            name: "Om".into(),
            date_val: NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            month_val: "February".into(),
            year_val: "2026".into(),
            day_val: "Tuesday".into(),
            check_in: None,
            check_out: None,
            work_hours: None,
            ot_hours: None,
            remark: None,
            absent: None,
        };
        let period = Period {
            month: Some(" february ".into()),
            year: Some("2026".into()),
        };
        assert!(period.contains(&record));
        assert!(!Period { month: None, year: Some("2025".into()) }.contains(&record));
    }
}
