use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod engine;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use config::Config;
use db::{bootstrap_hr, init_db};

use crate::docs::ApiDoc;
use crate::store::{AttendanceStore, EmployeeConfigStore, StaffStore, mysql::MySqlStore};
use crate::utils::config_cache;
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Timesheet payroll service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url).await?;
    let store = Arc::new(MySqlStore::new(pool));

    if let Some((name, pin)) = &config.bootstrap_hr {
        bootstrap_hr(store.as_ref(), name, pin).await?;
    }

    let pool_for_cache_warmup = store.pool().clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = config_cache::warmup_config_cache(&pool_for_cache_warmup, 250).await {
            error!(error = %e, "Failed to warmup employee config cache");
        }
    });

    let attendance: Arc<dyn AttendanceStore> = store.clone();
    let staff: Arc<dyn StaffStore> = store.clone();
    let configs: Arc<dyn EmployeeConfigStore> = store;
    let attendance = Data::from(attendance);
    let staff = Data::from(staff);
    let configs = Data::from(configs);

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(attendance.clone())
            .app_data(staff.clone())
            .app_data(configs.clone())
            .app_data(config_data.clone())
            .service(index)
            // Configure auth, kiosk and protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
