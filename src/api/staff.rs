use crate::{
    api::store_failure,
    auth::{
        auth::AuthUser,
        password::{hash_pin, is_valid_pin},
    },
    config::Config,
    error::PayrollError,
    model::{
        employee::EmployeeConfig,
        role::Role,
        user::StaffEntry,
    },
    store::{EmployeeConfigStore, StaffStore},
    utils::config_cache,
};
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UpsertStaff {
    #[schema(example = "Om")]
    pub name: String,
    #[schema(example = "1111")]
    pub pin: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::Staff
}

#[derive(Deserialize, ToSchema)]
pub struct ConfigUpdate {
    #[schema(example = 18000.0)]
    pub monthly_salary: f64,
    #[schema(example = 26)]
    pub working_days: i32,
    #[schema(example = 8.0)]
    pub standard_hours_per_day: f64,
    #[schema(example = 0.0)]
    pub security_deposit: f64,
}

/// List staff
#[utoipa::path(
    get,
    path = "/api/staff",
    responses(
        (status = 200, description = "All staff accounts", body = [StaffEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn list_staff(
    auth: AuthUser,
    staff: web::Data<dyn StaffStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    Ok(match staff.list_users().await {
        Ok(users) => HttpResponse::Ok().json(
            users
                .into_iter()
                .map(StaffEntry::from)
                .collect::<Vec<_>>(),
        ),
        Err(e) => store_failure(&e),
    })
}

/// Add staff, or reset an existing member's PIN and role
#[utoipa::path(
    post,
    path = "/api/staff",
    request_body = UpsertStaff,
    responses(
        (status = 201, description = "Staff member added", body = Object, example = json!({
            "message": "Added Om"
        })),
        (status = 200, description = "Existing staff member updated"),
        (status = 400, description = "Empty name or PIN not 4 digits"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn upsert_staff(
    auth: AuthUser,
    staff: web::Data<dyn StaffStore>,
    payload: web::Json<UpsertStaff>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "Name is required" })));
    }
    if !is_valid_pin(&payload.pin) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "PIN must be exactly 4 digits"
        })));
    }

    let hash = match hash_pin(&payload.pin) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Failed to hash PIN");
            return Ok(HttpResponse::InternalServerError().finish());
        }
    };

    Ok(match staff.upsert_user(name, &hash, payload.role).await {
        Ok(true) => {
            info!(by = %auth.name, staff = name, role = %payload.role, "staff member added");
            HttpResponse::Created().json(json!({ "message": format!("Added {name}") }))
        }
        Ok(false) => {
            info!(by = %auth.name, staff = name, role = %payload.role, "staff member updated");
            HttpResponse::Ok().json(json!({ "message": format!("Updated {name}") }))
        }
        Err(e) => store_failure(&e),
    })
}

/// Remove staff
#[utoipa::path(
    delete,
    path = "/api/staff/{name}",
    params(("name", description = "Staff name")),
    responses(
        (status = 200, description = "Removed"),
        (status = 400, description = "Cannot remove your own account"),
        (status = 404, description = "No such staff member")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn delete_staff(
    auth: AuthUser,
    path: web::Path<String>,
    staff: web::Data<dyn StaffStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    let name = path.into_inner();
    if name == auth.name {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "You cannot remove your own account"
        })));
    }

    Ok(match staff.delete_user(&name).await {
        Ok(true) => {
            info!(by = %auth.name, staff = %name, "staff member removed");
            HttpResponse::Ok().json(json!({ "message": format!("Removed {name}") }))
        }
        Ok(false) => HttpResponse::NotFound().json(json!({ "message": "Staff member not found" })),
        Err(e) => store_failure(&e),
    })
}

/// Payroll configuration of one employee, defaults when none is stored
#[utoipa::path(
    get,
    path = "/api/staff/{name}/config",
    params(("name", description = "Staff name")),
    responses(
        (status = 200, description = "Effective configuration", body = EmployeeConfig),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn get_config(
    auth: AuthUser,
    path: web::Path<String>,
    configs: web::Data<dyn EmployeeConfigStore>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    let name = path.into_inner();
    Ok(
        match config_cache::lookup(configs.get_ref(), &config.config_defaults, &name).await {
            Ok(found) => HttpResponse::Ok().json(found),
            Err(e) => store_failure(&e),
        },
    )
}

/// Store an employee's payroll configuration
#[utoipa::path(
    put,
    path = "/api/staff/{name}/config",
    request_body = ConfigUpdate,
    params(("name", description = "Staff name")),
    responses(
        (status = 200, description = "Saved", body = EmployeeConfig),
        (status = 400, description = "Non-positive working days or hours, or negative amounts")
    ),
    security(("bearer_auth" = [])),
    tag = "Staff"
)]
pub async fn put_config(
    auth: AuthUser,
    path: web::Path<String>,
    payload: web::Json<ConfigUpdate>,
    configs: web::Data<dyn EmployeeConfigStore>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr()?;

    let shape_ok = payload.working_days > 0 && payload.standard_hours_per_day > 0.0;
    if !shape_ok {
        let e = PayrollError::InvalidConfiguration {
            working_days: payload.working_days,
            standard_hours_per_day: payload.standard_hours_per_day,
        };
        return Ok(HttpResponse::BadRequest().json(json!({ "message": e.to_string() })));
    }
    let amounts_ok = payload.monthly_salary >= 0.0 && payload.security_deposit >= 0.0;
    if !amounts_ok {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Salary and security deposit cannot be negative"
        })));
    }

    let updated = EmployeeConfig {
        name: path.into_inner(),
        monthly_salary: payload.monthly_salary,
        working_days: payload.working_days,
        standard_hours_per_day: payload.standard_hours_per_day,
        security_deposit: payload.security_deposit,
    };

    if let Err(e) = configs.upsert_config(&updated).await {
        // a stale cached entry would outlive the failed write
        config_cache::forget(&updated.name).await;
        return Ok(store_failure(&e));
    }
    config_cache::remember(&updated).await;
    info!(by = %auth.name, employee = %updated.name, "payroll config saved");

    Ok(HttpResponse::Ok().json(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{bearer, seed_user, stores};
    use actix_web::{App, http::StatusCode, test};
    use serde_json::Value;

    #[actix_web::test]
    async fn hr_manages_staff() {
        let s = stores();
        let config = Config::for_tests();
        seed_user(&s.memory, "Sangeeta", "0000", Role::Hr).await;
        let app = test::init_service(
            App::new()
                .app_data(s.staff.clone())
                .app_data(web::Data::new(config.clone()))
                .route("/api/staff", web::get().to(list_staff))
                .route("/api/staff", web::post().to(upsert_staff))
                .route("/api/staff/{name}", web::delete().to(delete_staff)),
        )
        .await;
        let hr = || bearer(&config, "Sangeeta", Role::Hr);

        let req = test::TestRequest::post()
            .uri("/api/staff")
            .insert_header(hr())
            .set_json(json!({ "name": "Om", "pin": "12a4" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/staff")
            .insert_header(hr())
            .set_json(json!({ "name": " Om ", "pin": "1234" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/staff")
            .insert_header(hr())
            .set_json(json!({ "name": "Om", "pin": "4321", "role": "hr" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/staff").insert_header(hr()).to_request();
        let listed: Vec<Value> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0], json!({ "name": "Om", "role": "hr" }));
        assert!(listed.iter().all(|u| u.get("pin_hash").is_none()));

        let req = test::TestRequest::delete()
            .uri("/api/staff/Sangeeta")
            .insert_header(hr())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete()
            .uri("/api/staff/Om")
            .insert_header(hr())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri("/api/staff/Om")
            .insert_header(hr())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn config_falls_back_to_defaults_until_saved() {
        let s = stores();
        let config = Config::for_tests();
        let app = test::init_service(
            App::new()
                .app_data(s.configs.clone())
                .app_data(web::Data::new(config.clone()))
                .route("/api/staff/{name}/config", web::get().to(get_config))
                .route("/api/staff/{name}/config", web::put().to(put_config)),
        )
        .await;
        let hr = || bearer(&config, "Sangeeta", Role::Hr);
        let uri = "/api/staff/staff-api-config-test/config";

        let req = test::TestRequest::get().uri(uri).insert_header(hr()).to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found["monthly_salary"], json!(18000.0));
        assert_eq!(found["working_days"], json!(26));

        let req = test::TestRequest::put()
            .uri(uri)
            .insert_header(hr())
            .set_json(json!({
                "monthly_salary": 20000.0,
                "working_days": 0,
                "standard_hours_per_day": 8.0,
                "security_deposit": 0.0
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(uri)
            .insert_header(hr())
            .set_json(json!({
                "monthly_salary": 20000.0,
                "working_days": 25,
                "standard_hours_per_day": 8.0,
                "security_deposit": 2500.0
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(uri).insert_header(hr()).to_request();
        let found: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(found["monthly_salary"], json!(20000.0));
        assert_eq!(found["security_deposit"], json!(2500.0));
    }
}
