use crate::{
    api::store_failure,
    auth::auth::AuthUser,
    config::{Config, overtime_policy},
    engine::{
        calculator::{PayrollCalculator, PayrollPolicy, PayrollRun},
        export::{Sheet, export_file_name, write_summary, write_timesheet},
        ingest::read_timesheet,
        normalizer::RawRow,
    },
    error::PayrollError,
    model::{
        attendance::{AttendanceRecord, Period},
        employee::EmployeeConfig,
        payroll::PayrollSummary,
    },
    store::{AttendanceStore, EmployeeConfigStore},
    utils::config_cache,
};
use actix_web::{
    HttpResponse, Responder,
    http::{StatusCode, header},
    web,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, instrument};
use utoipa::{IntoParams, ToSchema};

const NOTHING_TO_PROCESS: &str = "No attendance records found to process.";

/// Period selection plus per-request overtime settings layered over the
/// configured policy.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = "February")]
    pub month: Option<String>,

    #[schema(example = "2026")]
    pub year: Option<String>,

    /// `fixed` or `multiplier`
    #[schema(example = "fixed")]
    pub overtime_mode: Option<String>,

    /// Flat amount per overtime hour in `fixed` mode.
    #[schema(example = 100.0)]
    pub overtime_rate: Option<f64>,

    /// Multiple of the per-hour rate in `multiplier` mode.
    #[schema(example = 1.5)]
    pub overtime_multiplier: Option<f64>,
}

impl PayrollQuery {
    fn period(&self) -> Period {
        Period {
            month: self.month.clone(),
            year: self.year.clone(),
        }
    }

    fn policy(&self, config: &Config) -> anyhow::Result<PayrollPolicy> {
        let base = &config.overtime;
        let overtime = overtime_policy(
            self.overtime_mode.as_deref().unwrap_or(&base.mode),
            self.overtime_rate.unwrap_or(base.fixed_rate),
            self.overtime_multiplier.unwrap_or(base.multiplier),
        )?;
        Ok(PayrollPolicy {
            overtime,
            tax: config.tax.clone(),
        })
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SheetQuery {
    /// `timesheet` or `summary`
    pub sheet: Option<Sheet>,
}

/// Configuration for an uploaded sheet. Missing values fall back to the
/// configured defaults.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ExternalQuery {
    pub employee: Option<String>,
    pub monthly_salary: Option<f64>,
    pub working_days: Option<i32>,
    pub standard_hours_per_day: Option<f64>,
    pub security_deposit: Option<f64>,
}

impl ExternalQuery {
    fn config(&self, config: &Config) -> EmployeeConfig {
        let defaults = config.config_defaults;
        EmployeeConfig {
            name: self
                .employee
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .unwrap_or("External User")
                .to_string(),
            monthly_salary: self.monthly_salary.unwrap_or(defaults.monthly_salary),
            working_days: self.working_days.unwrap_or(defaults.working_days),
            standard_hours_per_day: self
                .standard_hours_per_day
                .unwrap_or(defaults.standard_hours_per_day),
            security_deposit: self.security_deposit.unwrap_or(defaults.security_deposit),
        }
    }
}

fn message(status: StatusCode, text: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(json!({ "message": text.into() }))
}

fn invalid(e: PayrollError) -> HttpResponse {
    message(StatusCode::BAD_REQUEST, e.to_string())
}

fn csv_attachment(run: &PayrollRun, sheet: Sheet) -> HttpResponse {
    let mut buf = Vec::new();
    let written = match sheet {
        Sheet::Timesheet => write_timesheet(&run.batch, &mut buf),
        Sheet::Summary => write_summary(&run.summary, &mut buf),
    };
    if let Err(e) = written {
        error!(error = %e, %sheet, "Failed to render CSV export");
        return HttpResponse::InternalServerError().finish();
    }

    let file_name = export_file_name(&run.summary.employee, sheet, Local::now().naive_local());
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        ))
        .body(buf)
}

/// Loads the employee's records and configuration and runs the calculator.
/// `Err` carries the response to send as is.
async fn run_for_employee(
    name: &str,
    query: &PayrollQuery,
    attendance: &dyn AttendanceStore,
    configs: &dyn EmployeeConfigStore,
    config: &Config,
) -> Result<Option<PayrollRun>, HttpResponse> {
    let policy = query.policy(config).map_err(|e| {
        message(StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let records = attendance
        .list_for_employee(name, &query.period())
        .await
        .map_err(|e| store_failure(&e))?;
    let rows: Vec<RawRow> = records.iter().map(AttendanceRecord::to_raw_row).collect();

    let employee = config_cache::lookup(configs, &config.config_defaults, name)
        .await
        .map_err(|e| store_failure(&e))?;

    PayrollCalculator::new(policy)
        .run(rows, &employee)
        .map_err(invalid)
}

/// Computes an employee's payroll
#[utoipa::path(
    get,
    path = "/api/payroll/{name}",
    params(("name", description = "Staff name"), PayrollQuery),
    responses(
        (status = 200, description = "Payroll summary, or a message when there is nothing to process", body = PayrollSummary),
        (status = 400, description = "Invalid configuration or overtime settings", body = Object, example = json!({
            "message": "working days (0) and standard hours per day (8) must be greater than 0"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
#[instrument(name = "payroll_compute", skip(auth, path, query, attendance, configs, config), fields(employee = %path.as_str()))]
pub async fn compute_payroll(
    auth: AuthUser,
    path: web::Path<String>,
    query: web::Query<PayrollQuery>,
    attendance: web::Data<dyn AttendanceStore>,
    configs: web::Data<dyn EmployeeConfigStore>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    let name = path.into_inner();
    let run = match run_for_employee(
        &name,
        &query,
        attendance.get_ref(),
        configs.get_ref(),
        &config,
    )
    .await
    {
        Ok(run) => run,
        Err(resp) => return Ok(resp),
    };

    Ok(match run {
        Some(run) => HttpResponse::Ok().json(run.summary),
        None => message(StatusCode::OK, NOTHING_TO_PROCESS),
    })
}

/// Downloads the timesheet or summary sheet as CSV
#[utoipa::path(
    get,
    path = "/api/payroll/{name}/export",
    params(("name", description = "Staff name"), PayrollQuery, SheetQuery),
    responses(
        (status = 200, description = "CSV attachment", body = String, content_type = "text/csv"),
        (status = 404, description = "No attendance records in the period"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn export_payroll(
    auth: AuthUser,
    path: web::Path<String>,
    query: web::Query<PayrollQuery>,
    sheet: web::Query<SheetQuery>,
    attendance: web::Data<dyn AttendanceStore>,
    configs: web::Data<dyn EmployeeConfigStore>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    let name = path.into_inner();
    let run = match run_for_employee(
        &name,
        &query,
        attendance.get_ref(),
        configs.get_ref(),
        &config,
    )
    .await
    {
        Ok(run) => run,
        Err(resp) => return Ok(resp),
    };

    Ok(match run {
        Some(run) => {
            let sheet = sheet.sheet.unwrap_or_default();
            info!(by = %auth.name, employee = %name, %sheet, "payroll exported");
            csv_attachment(&run, sheet)
        }
        None => message(StatusCode::NOT_FOUND, NOTHING_TO_PROCESS),
    })
}

/// Computes payroll for an uploaded CSV or XLSX timesheet
///
/// Returns the JSON summary, or a CSV attachment when `sheet` is given.
#[utoipa::path(
    post,
    path = "/api/payroll/external",
    params(ExternalQuery, PayrollQuery, SheetQuery),
    request_body(
        content = String,
        description = "CSV text, or an XLSX workbook whose first worksheet is read",
        content_type = "text/csv"
    ),
    responses(
        (status = 200, description = "Payroll summary", body = PayrollSummary),
        (status = 400, description = "Unreadable upload or invalid configuration"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn external_payroll(
    auth: AuthUser,
    body: web::Bytes,
    external: web::Query<ExternalQuery>,
    query: web::Query<PayrollQuery>,
    sheet: web::Query<SheetQuery>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    let policy = match query.policy(&config) {
        Ok(p) => p,
        Err(e) => {
            return Ok(message(
                StatusCode::BAD_REQUEST,
                e.to_string(),
            ));
        }
    };

    let rows = match read_timesheet(&body) {
        Ok(rows) => rows,
        Err(e) => {
            info!(error = %e, "rejected uploaded timesheet");
            return Ok(message(StatusCode::BAD_REQUEST, e.to_string()));
        }
    };

    let employee = external.config(&config);
    let run = match PayrollCalculator::new(policy).run(rows, &employee) {
        Ok(run) => run,
        Err(e) => return Ok(invalid(e)),
    };

    Ok(match (run, sheet.sheet) {
        (Some(run), Some(sheet)) => csv_attachment(&run, sheet),
        (Some(run), None) => HttpResponse::Ok().json(run.summary),
        (None, _) => message(StatusCode::OK, NOTHING_TO_PROCESS),
    })
}
