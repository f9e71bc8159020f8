use crate::api::payroll::PayrollQuery;
use crate::api::staff::{ConfigUpdate, UpsertStaff};
use crate::auth::handlers::LoginResponse;
use crate::engine::calculator::OvertimePolicy;
use crate::engine::export::Sheet;
use crate::model::attendance::{AttendanceRecord, Period};
use crate::model::employee::EmployeeConfig;
use crate::model::payroll::PayrollSummary;
use crate::model::role::Role;
use crate::model::user::StaffEntry;
use crate::models::CredentialsDto;
use crate::service::attendance::RecordEdit;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Timesheet Payroll API",
        version = "1.0.0",
        description = r#"
## Attendance to Payroll

Staff check in and out at a kiosk with their name and 4-digit PIN. HR turns
the month's attendance into a payroll summary.

### 🔹 Key Features
- **Attendance**
  - Kiosk check-in / check-out, forgotten shifts closed automatically
  - HR review and correction of records
- **Staff**
  - Accounts, PINs and per-employee payroll configuration
- **Payroll**
  - Leave, professional-tax and security-deposit deductions, overtime pay
  - CSV export of the timesheet and summary sheets
  - Payroll for an uploaded CSV timesheet

### 🔐 Security
Everything under the API prefix requires an **HR** JWT bearer token.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_records,
        crate::api::attendance::edit_record,

        crate::api::staff::list_staff,
        crate::api::staff::upsert_staff,
        crate::api::staff::delete_staff,
        crate::api::staff::get_config,
        crate::api::staff::put_config,

        crate::api::payroll::compute_payroll,
        crate::api::payroll::export_payroll,
        crate::api::payroll::external_payroll
    ),
    components(
        schemas(
            CredentialsDto,
            LoginResponse,
            AttendanceRecord,
            Period,
            RecordEdit,
            StaffEntry,
            UpsertStaff,
            Role,
            EmployeeConfig,
            ConfigUpdate,
            PayrollSummary,
            PayrollQuery,
            OvertimePolicy,
            Sheet
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "HR login and token rotation"),
        (name = "Attendance", description = "Kiosk check-in / check-out and record review"),
        (name = "Staff", description = "Staff accounts and payroll configuration"),
        (name = "Payroll", description = "Payroll computation and export"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
