use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::employee::{ConfigDefaults, EmployeeConfig};
use crate::store::EmployeeConfigStore;

/// Employee payroll configurations keyed by name. Only stored entries are
/// cached, defaults are rebuilt on every miss so a later upsert wins.
pub static CONFIG_CACHE: Lazy<Cache<String, EmployeeConfig>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(3600)) // 1h TTL
        .build()
});

pub async fn remember(config: &EmployeeConfig) {
    CONFIG_CACHE.insert(config.name.clone(), config.clone()).await;
}

pub async fn forget(name: &str) {
    CONFIG_CACHE.invalidate(name).await;
}

/// Cache, then store, then the documented defaults.
pub async fn lookup(
    store: &dyn EmployeeConfigStore,
    defaults: &ConfigDefaults,
    name: &str,
) -> Result<EmployeeConfig, StoreError> {
    if let Some(config) = CONFIG_CACHE.get(name).await {
        return Ok(config);
    }

    match store.get_config(name).await? {
        Some(config) => {
            remember(&config).await;
            Ok(config)
        }
        None => {
            debug!(employee = name, "no stored payroll config, using defaults");
            Ok(defaults.for_employee(name))
        }
    }
}

/// Loads every stored configuration into the cache, in batches.
pub async fn warmup_config_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream = sqlx::query_as::<_, EmployeeConfig>(
        r#"
        SELECT name, monthly_salary, working_days, standard_hours_per_day, security_deposit
        FROM employee_config
        "#,
    )
    .fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total_count = 0usize;

    while let Some(row) = stream.next().await {
        batch.push(row?);
        total_count += 1;

        if batch.len() >= batch_size {
            futures::future::join_all(batch.iter().map(remember)).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        futures::future::join_all(batch.iter().map(remember)).await;
    }

    info!(total_count, "Employee config cache warmup complete");

    Ok(())
}
