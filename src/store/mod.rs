//! Record stores the service reads and writes through.

#[cfg(test)]
pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::{
    attendance::{AttendancePatch, AttendanceRecord, NewAttendance, Period},
    employee::EmployeeConfig,
    role::Role,
    user::StaffUser,
};

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Inserts an open shift and returns its id.
    async fn insert(&self, record: &NewAttendance) -> Result<u64, StoreError>;

    async fn get(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError>;

    /// The employee's record for `date`, the oldest one if several exist.
    async fn find_by(
        &self,
        name: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Records still missing a check-out on any date other than `excluding`.
    async fn find_open_shifts_before(
        &self,
        name: &str,
        excluding: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn update(&self, id: u64, patch: &AttendancePatch) -> Result<(), StoreError>;

    /// The employee's records in date order, restricted to `period`.
    async fn list_for_employee(
        &self,
        name: &str,
        period: &Period,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;
}

#[async_trait]
pub trait StaffStore: Send + Sync {
    async fn find_user(&self, name: &str) -> Result<Option<StaffUser>, StoreError>;

    async fn list_users(&self) -> Result<Vec<StaffUser>, StoreError>;

    /// Adds the user or replaces their PIN and role. Returns `true` when a
    /// new user was created.
    async fn upsert_user(&self, name: &str, pin_hash: &str, role: Role)
    -> Result<bool, StoreError>;

    /// Returns `false` when no such user existed.
    async fn delete_user(&self, name: &str) -> Result<bool, StoreError>;

    async fn count_role(&self, role: Role) -> Result<i64, StoreError>;

    async fn save_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: i64,
    ) -> Result<(), StoreError>;

    /// Revokes a live refresh token and returns its owner. `None` when the
    /// token is unknown or already revoked.
    async fn consume_refresh_token(&self, jti: &str) -> Result<Option<u64>, StoreError>;
}

#[async_trait]
pub trait EmployeeConfigStore: Send + Sync {
    async fn get_config(&self, name: &str) -> Result<Option<EmployeeConfig>, StoreError>;

    async fn upsert_config(&self, config: &EmployeeConfig) -> Result<(), StoreError>;
}
