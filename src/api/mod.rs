pub mod attendance;
pub mod payroll;
pub mod staff;

use actix_web::HttpResponse;
use serde_json::json;
use tracing::error;

use crate::error::StoreError;

/// Logs a store failure and hides it behind a generic 500.
pub(crate) fn store_failure(e: &StoreError) -> HttpResponse {
    match e {
        StoreError::NotFound(id) => {
            HttpResponse::NotFound().json(json!({ "message": format!("Record {id} not found") }))
        }
        StoreError::Database(_) => {
            error!(error = %e, "store failure");
            HttpResponse::InternalServerError().json(json!({
                "message": "Something went wrong, Contact with system admin"
            }))
        }
    }
}
