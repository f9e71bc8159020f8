use crate::{
    api::store_failure,
    auth::{
        auth::AuthUser,
        authenticator::{CredentialVerifier, PinAuthenticator},
    },
    config::Config,
    error::AttendanceError,
    model::attendance::{AttendanceRecord, Period},
    models::CredentialsDto,
    service::attendance::{self as shifts, RecordEdit, ShiftContext},
    store::{AttendanceStore, StaffStore},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde_json::json;
use tracing::{info, instrument};

fn rejected(e: AttendanceError) -> HttpResponse {
    match e {
        AttendanceError::Store(e) => store_failure(&e),
        other => HttpResponse::BadRequest().json(json!({ "message": other.to_string() })),
    }
}

/// `None` when the name / PIN pair is accepted.
async fn deny_unless_valid(staff: &dyn StaffStore, creds: &CredentialsDto) -> Option<HttpResponse> {
    match PinAuthenticator::new(staff)
        .verify(creds.name.trim(), &creds.pin)
        .await
    {
        Ok(v) if v.valid => None,
        Ok(_) => Some(
            HttpResponse::Unauthorized().json(json!({ "message": "Invalid name or PIN" })),
        ),
        Err(e) => Some(store_failure(&e)),
    }
}

fn shift_context(config: &Config) -> ShiftContext {
    ShiftContext {
        now: Local::now().naive_local(),
        auto_checkout: config.auto_checkout_time,
    }
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/attendance/check-in",
    request_body = CredentialsDto,
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in at 09:00:00",
            "record_id": 42,
            "auto_closed": [41]
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "already checked in today at 09:00:00"
        })),
        (status = 401, description = "Invalid name or PIN"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_in", skip(creds, store, staff, config), fields(name = %creds.name))]
pub async fn check_in(
    creds: web::Json<CredentialsDto>,
    store: web::Data<dyn AttendanceStore>,
    staff: web::Data<dyn StaffStore>,
    config: web::Data<Config>,
) -> impl Responder {
    if let Some(denied) = deny_unless_valid(staff.get_ref(), &creds).await {
        info!("check-in refused");
        return denied;
    }

    match shifts::check_in(store.get_ref(), creds.name.trim(), &shift_context(&config)).await {
        Ok(opened) => HttpResponse::Ok().json(json!({
            "message": format!("Checked in at {}", opened.time),
            "record_id": opened.record_id,
            "auto_closed": opened.auto_closed,
        })),
        Err(e) => rejected(e),
    }
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/attendance/check-out",
    request_body = CredentialsDto,
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out at 17:30:00",
            "record_id": 42,
            "work_hours": 8.5
        })),
        (status = 400, description = "No check-in today, or already checked out", body = Object, example = json!({
            "message": "no check-in record found for today, check in first"
        })),
        (status = 401, description = "Invalid name or PIN"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_out", skip(creds, store, staff, config), fields(name = %creds.name))]
pub async fn check_out(
    creds: web::Json<CredentialsDto>,
    store: web::Data<dyn AttendanceStore>,
    staff: web::Data<dyn StaffStore>,
    config: web::Data<Config>,
) -> impl Responder {
    if let Some(denied) = deny_unless_valid(staff.get_ref(), &creds).await {
        info!("check-out refused");
        return denied;
    }

    match shifts::check_out(store.get_ref(), creds.name.trim(), &shift_context(&config)).await {
        Ok(closed) => HttpResponse::Ok().json(json!({
            "message": format!("Checked out at {}", closed.time),
            "record_id": closed.record_id,
            "work_hours": closed.work_hours,
        })),
        Err(e) => rejected(e),
    }
}

/// Lists an employee's attendance records
#[utoipa::path(
    get,
    path = "/api/attendance/{name}",
    params(
        ("name", description = "Staff name"),
        ("month" = Option<String>, Query, description = "Month name, e.g. February"),
        ("year" = Option<String>, Query, description = "Year, e.g. 2026")
    ),
    responses(
        (status = 200, description = "Records in date order", body = [AttendanceRecord]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn list_records(
    auth: AuthUser,
    path: web::Path<String>,
    period: web::Query<Period>,
    store: web::Data<dyn AttendanceStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    let name = path.into_inner();
    Ok(match store.list_for_employee(&name, &period).await {
        Ok(records) => HttpResponse::Ok().json(records),
        Err(e) => store_failure(&e),
    })
}

/// Corrects an attendance record
#[utoipa::path(
    put,
    path = "/api/attendance/record/{id}",
    request_body = RecordEdit,
    params(("id", description = "Attendance record ID")),
    responses(
        (status = 200, description = "Record updated, hours recomputed", body = AttendanceRecord),
        (status = 404, description = "Record not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn edit_record(
    auth: AuthUser,
    path: web::Path<u64>,
    payload: web::Json<RecordEdit>,
    store: web::Data<dyn AttendanceStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    let id = path.into_inner();
    Ok(match shifts::edit_record(store.get_ref(), id, &payload).await {
        Ok(record) => {
            info!(editor = %auth.name, record_id = id, "attendance corrected");
            HttpResponse::Ok().json(record)
        }
        Err(e) => rejected(e),
    })
}
