use crate::auth::auth::AuthUser;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use tracing::debug;

fn reject(req: ServiceRequest, reason: &str) -> ServiceResponse<BoxBody> {
    debug!(path = %req.path(), reason, "rejected unauthenticated request");
    let resp = HttpResponse::Unauthorized().json(json!({ "message": reason }));
    req.into_response(resp.map_into_boxed_body())
}

/// Resolves the bearer access token into an [`AuthUser`] request extension.
/// Role checks are left to the handlers.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);
    let Some(token) = token else {
        return Ok(reject(req, "Missing bearer token"));
    };

    match AuthUser::from_token(&token, &config.jwt_secret) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(reason) => Ok(reject(req, reason)),
    }
}
