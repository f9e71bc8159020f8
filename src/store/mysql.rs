use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::debug;

use super::{AttendanceStore, EmployeeConfigStore, StaffStore};
use crate::error::StoreError;
use crate::model::{
    attendance::{AttendancePatch, AttendanceRecord, NewAttendance, Period},
    employee::EmployeeConfig,
    role::Role,
    user::StaffUser,
};
use crate::utils::db_utils::{attendance_assignments, build_update_sql, execute_update};

const ATTENDANCE_COLUMNS: &str = "id, name, date_val, month_val, year_val, day_val, \
     check_in, check_out, work_hours, ot_hours, remark, absent";

/// MySQL implementation of every store trait.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn insert(&self, record: &NewAttendance) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (name, date_val, month_val, year_val, day_val, check_in)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.name)
        .bind(record.date_val)
        .bind(&record.month_val)
        .bind(&record.year_val)
        .bind(&record.day_val)
        .bind(&record.check_in)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn get(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE id = ?");
        Ok(sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by(
        &self,
        name: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE name = ? AND date_val = ? ORDER BY id LIMIT 1"
        );
        Ok(sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(name)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_open_shifts_before(
        &self,
        name: &str,
        excluding: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE name = ? AND check_out IS NULL AND date_val <> ? ORDER BY date_val, id"
        );
        Ok(sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(name)
            .bind(excluding)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, id: u64, patch: &AttendancePatch) -> Result<(), StoreError> {
        let Some(update) = build_update_sql("attendance", attendance_assignments(patch), "id", id)
        else {
            return Ok(());
        };

        debug!(id, sql = %update.sql, "updating attendance record");
        let affected = execute_update(&self.pool, update).await?;
        if affected == 0 && self.get(id).await?.is_none() {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn list_for_employee(
        &self,
        name: &str,
        period: &Period,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance \
             WHERE name = ? \
             AND (? IS NULL OR TRIM(month_val) = TRIM(?)) \
             AND (? IS NULL OR TRIM(year_val) = TRIM(?)) \
             ORDER BY date_val, id"
        );
        Ok(sqlx::query_as::<_, AttendanceRecord>(&sql)
            .bind(name)
            .bind(&period.month)
            .bind(&period.month)
            .bind(&period.year)
            .bind(&period.year)
            .fetch_all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl StaffStore for MySqlStore {
    async fn find_user(&self, name: &str) -> Result<Option<StaffUser>, StoreError> {
        Ok(sqlx::query_as::<_, StaffUser>(
            "SELECT id, name, pin_hash, role FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_users(&self) -> Result<Vec<StaffUser>, StoreError> {
        Ok(
            sqlx::query_as::<_, StaffUser>("SELECT id, name, pin_hash, role FROM users ORDER BY name")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn upsert_user(
        &self,
        name: &str,
        pin_hash: &str,
        role: Role,
    ) -> Result<bool, StoreError> {
        let existing = self.find_user(name).await?;

        match existing {
            Some(user) => {
                sqlx::query("UPDATE users SET pin_hash = ?, role = ? WHERE id = ?")
                    .bind(pin_hash)
                    .bind(role.as_ref())
                    .bind(user.id)
                    .execute(&self.pool)
                    .await?;
                Ok(false)
            }
            None => {
                sqlx::query("INSERT INTO users (name, pin_hash, role) VALUES (?, ?, ?)")
                    .bind(name)
                    .bind(pin_hash)
                    .bind(role.as_ref())
                    .execute(&self.pool)
                    .await?;
                Ok(true)
            }
        }
    }

    async fn delete_user(&self, name: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_role(&self, role: Role) -> Result<i64, StoreError> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ?")
                .bind(role.as_ref())
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn save_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: i64,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, FROM_UNIXTIME(?))
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_refresh_token(&self, jti: &str) -> Result<Option<u64>, StoreError> {
        let record = sqlx::query_as::<_, (u64, u64, bool)>(
            "SELECT id, user_id, revoked FROM refresh_tokens WHERE jti = ?",
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        let (id, user_id) = match record {
            Some((id, user_id, false)) => (id, user_id),
            _ => return Ok(None),
        };

        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Some(user_id))
    }
}

#[async_trait]
impl EmployeeConfigStore for MySqlStore {
    async fn get_config(&self, name: &str) -> Result<Option<EmployeeConfig>, StoreError> {
        Ok(sqlx::query_as::<_, EmployeeConfig>(
            r#"
            SELECT name, monthly_salary, working_days, standard_hours_per_day, security_deposit
            FROM employee_config
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert_config(&self, config: &EmployeeConfig) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO employee_config
            (name, monthly_salary, working_days, standard_hours_per_day, security_deposit)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                monthly_salary = VALUES(monthly_salary),
                working_days = VALUES(working_days),
                standard_hours_per_day = VALUES(standard_hours_per_day),
                security_deposit = VALUES(security_deposit)
            "#,
        )
        .bind(&config.name)
        .bind(config.monthly_salary)
        .bind(config.working_days)
        .bind(config.standard_hours_per_day)
        .bind(config.security_deposit)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
