use anyhow::{Context, Result};
use sqlx::MySqlPool;
use tracing::{info, warn};

use crate::auth::password::{hash_pin, is_valid_pin};
use crate::model::role::Role;
use crate::store::StaffStore;

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Creates the configured HR account when the database has no HR user yet.
pub async fn bootstrap_hr(staff: &dyn StaffStore, name: &str, pin: &str) -> Result<()> {
    if staff.count_role(Role::Hr).await? > 0 {
        return Ok(());
    }
    if name.trim().is_empty() || !is_valid_pin(pin) {
        warn!("BOOTSTRAP_HR_NAME / BOOTSTRAP_HR_PIN are invalid, no HR account seeded");
        return Ok(());
    }

    let hash = hash_pin(pin).map_err(|e| anyhow::anyhow!("hashing bootstrap PIN: {e}"))?;
    staff.upsert_user(name.trim(), &hash, Role::Hr).await?;
    info!(name = name.trim(), "seeded first HR account");
    Ok(())
}
