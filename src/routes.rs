use crate::{
    api::{attendance, payroll, staff},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let requests_per_min = requests_per_min.max(1);
        let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let attendance_limiter = Arc::new(build_limiter(config.rate_attendance_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Kiosk: name + PIN in the body, no token
    cfg.service(
        web::scope("/attendance")
            .wrap(attendance_limiter)
            .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
            .service(web::resource("/check-out").route(web::post().to(attendance::check_out))),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/staff")
                    // /staff
                    .service(
                        web::resource("")
                            .route(web::get().to(staff::list_staff))
                            .route(web::post().to(staff::upsert_staff)),
                    )
                    // /staff/{name}
                    .service(
                        web::resource("/{name}").route(web::delete().to(staff::delete_staff)),
                    )
                    // /staff/{name}/config
                    .service(
                        web::resource("/{name}/config")
                            .route(web::get().to(staff::get_config))
                            .route(web::put().to(staff::put_config)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance/record/{id}
                    .service(
                        web::resource("/record/{id}")
                            .route(web::put().to(attendance::edit_record)),
                    )
                    // /attendance/{name}
                    .service(
                        web::resource("/{name}").route(web::get().to(attendance::list_records)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll/external, ahead of /{name}
                    .service(
                        web::resource("/external")
                            .route(web::post().to(payroll::external_payroll)),
                    )
                    // /payroll/{name}
                    .service(
                        web::resource("/{name}").route(web::get().to(payroll::compute_payroll)),
                    )
                    // /payroll/{name}/export
                    .service(
                        web::resource("/{name}/export")
                            .route(web::get().to(payroll::export_payroll)),
                    ),
            ),
    );
}

// LOGIN (HR)
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// KIOSK
//  └─ POST /attendance/check-in | check-out with {name, pin}

// API REQUEST
//  └─ Authorization: Bearer access_token
