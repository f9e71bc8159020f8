use crate::{
    auth::{
        authenticator::{CredentialVerifier, PinAuthenticator},
        jwt::{generate_access_token, generate_refresh_token, verify_token},
    },
    config::Config,
    model::role::Role,
    models::{CredentialsDto, TokenType},
    store::StaffStore,
};
use actix_web::{HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Issues an access/refresh pair and stores the refresh token.
async fn issue_tokens(
    staff: &dyn StaffStore,
    config: &Config,
    user_id: u64,
    name: &str,
) -> Result<LoginResponse, HttpResponse> {
    let access_token = generate_access_token(
        user_id,
        name,
        Role::Hr,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        HttpResponse::InternalServerError().finish()
    })?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user_id,
        name,
        Role::Hr,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign refresh token");
        HttpResponse::InternalServerError().finish()
    })?;

    debug!(user_id, jti = %refresh_claims.jti, "Storing refresh token");

    staff
        .save_refresh_token(user_id, &refresh_claims.jti, refresh_claims.exp as i64)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to store refresh token");
            HttpResponse::InternalServerError().finish()
        })?;

    Ok(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// HR login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = CredentialsDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Name or PIN missing"),
        (status = 401, description = "Invalid credentials or not an HR account")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(staff, config, creds), fields(name = %creds.name))]
pub async fn login(
    creds: web::Json<CredentialsDto>,
    staff: web::Data<dyn StaffStore>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    if creds.name.trim().is_empty() || creds.pin.is_empty() {
        info!("Validation failed: empty name or PIN");
        return HttpResponse::BadRequest().json(json!({ "message": "Name and PIN required" }));
    }

    let verification = match PinAuthenticator::new(staff.get_ref())
        .verify(creds.name.trim(), &creds.pin)
        .await
    {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, "Database error while verifying credentials");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let user_id = match verification {
        v if v.valid && v.role == Some(Role::Hr) => v.user_id.unwrap_or_default(),
        _ => {
            info!("Access denied");
            return HttpResponse::Unauthorized().json(json!({ "message": "Access denied. Invalid PIN." }));
        }
    };

    match issue_tokens(staff.get_ref(), &config, user_id, creds.name.trim()).await {
        Ok(tokens) => {
            info!("Login successful");
            HttpResponse::Ok().json(tokens)
        }
        Err(resp) => resp,
    }
}

/// Rotates a refresh token
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = LoginResponse),
        (status = 401, description = "Refresh token invalid, expired or revoked")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    staff: web::Data<dyn StaffStore>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer(&req) else {
        return HttpResponse::Unauthorized().body("No token");
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    // 🔥 revoke old refresh token
    let user_id = match staff.consume_refresh_token(&claims.jti).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Failed to revoke refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // the account may have been removed or demoted since login
    match staff.find_user(&claims.sub).await {
        Ok(Some(user)) if user.id == user_id && Role::from_tag(&user.role) == Some(Role::Hr) => {}
        Ok(_) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Failed to load user for refresh");
            return HttpResponse::InternalServerError().finish();
        }
    }

    match issue_tokens(staff.get_ref(), &config, user_id, &claims.sub).await {
        Ok(tokens) => HttpResponse::Ok().json(tokens),
        Err(resp) => resp,
    }
}

/// Revokes a refresh token
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Logged out")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    staff: web::Data<dyn StaffStore>,
    config: web::Data<Config>,
) -> impl Responder {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::NoContent().finish(),
    };

    // only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    // idempotent, success even if the token was already gone
    if let Err(e) = staff.consume_refresh_token(&claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token on logout");
    }

    HttpResponse::NoContent().finish()
}
