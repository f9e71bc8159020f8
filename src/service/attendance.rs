use chrono::{NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::engine::hours::worked_hours_between;
use crate::error::{AttendanceError, StoreError};
use crate::model::attendance::{
    AUTO_CHECKOUT_REMARK, AttendancePatch, AttendanceRecord, NewAttendance, TIME_FORMAT,
};
use crate::store::AttendanceStore;

/// Request-scoped inputs of the shift state machine.
#[derive(Debug, Clone, Copy)]
pub struct ShiftContext {
    /// Local wall-clock time of the request.
    pub now: NaiveDateTime,
    /// Check-out written on shifts that were never closed.
    pub auto_checkout: NaiveTime,
}

impl ShiftContext {
    fn time_of_day(&self) -> String {
        self.now.format(TIME_FORMAT).to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckIn {
    pub record_id: u64,
    pub time: String,
    /// Earlier shifts closed automatically before this check-in.
    pub auto_closed: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckOut {
    pub record_id: u64,
    pub time: String,
    pub work_hours: f64,
}

/// Opens today's shift.
///
/// Shifts left open on earlier dates are closed first with the configured
/// auto-checkout time. That reconciliation stands even when the check-in
/// itself is then rejected.
pub async fn check_in(
    store: &dyn AttendanceStore,
    name: &str,
    ctx: &ShiftContext,
) -> Result<CheckIn, AttendanceError> {
    let today = ctx.now.date();

    let stale = store.find_open_shifts_before(name, today).await?;
    let auto_checkout = ctx.auto_checkout.format(TIME_FORMAT).to_string();
    let mut auto_closed = Vec::with_capacity(stale.len());
    for shift in stale {
        let patch = AttendancePatch {
            check_out: Some(Some(auto_checkout.clone())),
            remark: Some(Some(AUTO_CHECKOUT_REMARK.to_string())),
            ..Default::default()
        };
        store.update(shift.id, &patch).await?;
        info!(
            employee = name,
            record_id = shift.id,
            date = %shift.date_val,
            "closed forgotten shift"
        );
        auto_closed.push(shift.id);
    }

    if let Some(existing) = store.find_by(name, today).await? {
        if let Some(at) = existing.check_in {
            warn!(employee = name, %at, "already checked in today");
            return Err(AttendanceError::AlreadyCheckedIn { at });
        }
    }

    let record = NewAttendance::opened_at(name, ctx.now);
    let record_id = store.insert(&record).await?;
    info!(employee = name, record_id, time = %record.check_in, "checked in");

    Ok(CheckIn {
        record_id,
        time: record.check_in,
        auto_closed,
    })
}

/// Closes today's shift and records the hours worked.
pub async fn check_out(
    store: &dyn AttendanceStore,
    name: &str,
    ctx: &ShiftContext,
) -> Result<CheckOut, AttendanceError> {
    let Some(shift) = store.find_by(name, ctx.now.date()).await? else {
        return Err(AttendanceError::NoOpenShift);
    };
    if let Some(at) = shift.check_out {
        return Err(AttendanceError::AlreadyCheckedOut { at });
    }

    let time = ctx.time_of_day();
    let work_hours = worked_hours_between(shift.check_in.as_deref().unwrap_or_default(), &time);

    let patch = AttendancePatch {
        check_out: Some(Some(time.clone())),
        work_hours: Some(work_hours),
        ..Default::default()
    };
    store.update(shift.id, &patch).await?;
    info!(employee = name, record_id = shift.id, %time, work_hours, "checked out");

    Ok(CheckOut {
        record_id: shift.id,
        time,
        work_hours,
    })
}

/// Administrative correction of a record. Absent fields stay as they are,
/// an empty string clears the field.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecordEdit {
    #[schema(example = "09:00:00")]
    pub check_in: Option<String>,
    #[schema(example = "18:00:00")]
    pub check_out: Option<String>,
    #[schema(example = 1.0)]
    pub ot_hours: Option<f64>,
    #[schema(example = "Corrected by HR")]
    pub remark: Option<String>,
    #[schema(example = "")]
    pub absent: Option<String>,
}

fn cleared(v: &Option<String>) -> Option<Option<String>> {
    v.as_ref().map(|s| {
        let s = s.trim();
        (!s.is_empty()).then(|| s.to_string())
    })
}

/// Applies an edit and recomputes the worked hours from the resulting
/// check-in / check-out pair (0 when either is missing).
pub async fn edit_record(
    store: &dyn AttendanceStore,
    id: u64,
    edit: &RecordEdit,
) -> Result<AttendanceRecord, AttendanceError> {
    let mut record = store.get(id).await?.ok_or(StoreError::NotFound(id))?;

    let mut patch = AttendancePatch {
        check_in: cleared(&edit.check_in),
        check_out: cleared(&edit.check_out),
        ot_hours: edit.ot_hours.map(Some),
        remark: cleared(&edit.remark),
        absent: cleared(&edit.absent),
        ..Default::default()
    };
    patch.apply(&mut record);

    let work_hours = match (record.check_in.as_deref(), record.check_out.as_deref()) {
        (Some(ci), Some(co)) => worked_hours_between(ci, co),
        _ => 0.0,
    };
    patch.work_hours = Some(work_hours);
    record.work_hours = Some(work_hours);

    store.update(id, &patch).await?;
    info!(record_id = id, work_hours, "attendance record edited");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> ShiftContext {
        ShiftContext {
            now: NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 0)
                .unwrap(),
            auto_checkout: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
        }
    }

    #[actix_web::test]
    async fn check_in_then_out_records_hours() {
        let store = MemoryStore::new();
        let opened = check_in(&store, "Om", &at(2026, 1, 5, 9, 0)).await.unwrap();
        assert_eq!(opened.time, "09:00:00");
        assert!(opened.auto_closed.is_empty());

        let closed = check_out(&store, "Om", &at(2026, 1, 5, 17, 30)).await.unwrap();
        assert_eq!(closed.record_id, opened.record_id);
        assert_eq!(closed.work_hours, 8.5);

        let record = store.get(opened.record_id).await.unwrap().unwrap();
        assert_eq!(record.check_out.as_deref(), Some("17:30:00"));
        assert_eq!(record.work_hours, Some(8.5));
        assert_eq!(record.month_val, "January");
        assert_eq!(record.day_val, "Monday");
    }

    #[actix_web::test]
    async fn second_check_in_is_rejected_without_a_new_row() {
        let store = MemoryStore::new();
        check_in(&store, "Om", &at(2026, 1, 5, 9, 0)).await.unwrap();
        let err = check_in(&store, "Om", &at(2026, 1, 5, 10, 0)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyCheckedIn { ref at } if at == "09:00:00"));
        assert_eq!(store.records().len(), 1);
    }

    #[actix_web::test]
    async fn check_out_without_check_in_changes_nothing() {
        let store = MemoryStore::new();
        check_in(&store, "Om", &at(2026, 1, 4, 9, 0)).await.unwrap();
        let before = store.records();

        let err = check_out(&store, "Om", &at(2026, 1, 5, 17, 0)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::NoOpenShift));
        assert_eq!(store.records(), before);
    }

    #[actix_web::test]
    async fn second_check_out_is_rejected() {
        let store = MemoryStore::new();
        check_in(&store, "Om", &at(2026, 1, 5, 9, 0)).await.unwrap();
        check_out(&store, "Om", &at(2026, 1, 5, 17, 0)).await.unwrap();
        let before = store.records();

        let err = check_out(&store, "Om", &at(2026, 1, 5, 19, 0)).await.unwrap_err();
        assert!(matches!(err, AttendanceError::AlreadyCheckedOut { ref at } if at == "17:00:00"));
        assert_eq!(store.records(), before);
    }

    #[actix_web::test]
    async fn forgotten_shift_is_closed_before_the_next_check_in() {
        let store = MemoryStore::new();
        let yesterday = check_in(&store, "Om", &at(2026, 1, 4, 9, 0)).await.unwrap();
        check_in(&store, "Umesh", &at(2026, 1, 4, 9, 0)).await.unwrap();

        let today = check_in(&store, "Om", &at(2026, 1, 5, 9, 0)).await.unwrap();
        assert_eq!(today.auto_closed, vec![yesterday.record_id]);

        let closed = store.get(yesterday.record_id).await.unwrap().unwrap();
        assert_eq!(closed.check_out.as_deref(), Some("18:30:00"));
        assert_eq!(closed.remark.as_deref(), Some(AUTO_CHECKOUT_REMARK));

        let others_open = store
            .records()
            .into_iter()
            .filter(|r| r.name == "Umesh" && r.check_out.is_none())
            .count();
        assert_eq!(others_open, 1);
    }

    #[actix_web::test]
    async fn night_shift_wraps_past_midnight() {
        let store = MemoryStore::new();
        check_in(&store, "Om", &at(2026, 1, 5, 1, 0)).await.unwrap();
        // same calendar day, earlier clock time than the stored check-in
        store
            .update(
                1,
                &AttendancePatch {
                    check_in: Some(Some("22:00:00".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let closed = check_out(&store, "Om", &at(2026, 1, 5, 6, 0)).await.unwrap();
        assert_eq!(closed.work_hours, 8.0);
    }

    #[actix_web::test]
    async fn malformed_check_in_logs_zero_hours() {
        let store = MemoryStore::new();
        check_in(&store, "Om", &at(2026, 1, 5, 9, 0)).await.unwrap();
        store
            .update(
                1,
                &AttendancePatch {
                    check_in: Some(Some("nine".into())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let closed = check_out(&store, "Om", &at(2026, 1, 5, 17, 0)).await.unwrap();
        assert_eq!(closed.work_hours, 0.0);
    }

    #[actix_web::test]
    async fn edit_recomputes_hours() {
        let store = MemoryStore::new();
        let opened = check_in(&store, "Om", &at(2026, 1, 5, 9, 0)).await.unwrap();

        let edit = RecordEdit {
            check_out: Some("19:15:00".into()),
            remark: Some("late".into()),
            ..Default::default()
        };
        let record = edit_record(&store, opened.record_id, &edit).await.unwrap();
        assert_eq!(record.work_hours, Some(10.25));
        assert_eq!(store.get(opened.record_id).await.unwrap().unwrap(), record);

        let clear = RecordEdit {
            check_out: Some(String::new()),
            ..Default::default()
        };
        let record = edit_record(&store, opened.record_id, &clear).await.unwrap();
        assert_eq!(record.check_out, None);
        assert_eq!(record.work_hours, Some(0.0));
        assert_eq!(record.remark.as_deref(), Some("late"));
    }

    #[actix_web::test]
    async fn edit_of_unknown_record_fails() {
        let store = MemoryStore::new();
        let err = edit_record(&store, 42, &RecordEdit::default()).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Store(StoreError::NotFound(42))));
    }
}
