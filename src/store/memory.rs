//! In-memory stores backing the unit and HTTP tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AttendanceStore, EmployeeConfigStore, StaffStore};
use crate::error::StoreError;
use crate::model::{
    attendance::{AttendancePatch, AttendanceRecord, NewAttendance, Period},
    employee::EmployeeConfig,
    role::Role,
    user::StaffUser,
};

#[derive(Default)]
pub struct MemoryStore {
    attendance: Mutex<Vec<AttendanceRecord>>,
    users: Mutex<Vec<StaffUser>>,
    configs: Mutex<BTreeMap<String, EmployeeConfig>>,
    refresh_tokens: Mutex<Vec<(u64, String, bool)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a record as-is, for setting up historical rows.
    pub fn push_record(&self, record: AttendanceRecord) {
        self.attendance.lock().unwrap().push(record);
    }

    pub fn records(&self) -> Vec<AttendanceRecord> {
        self.attendance.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert(&self, record: &NewAttendance) -> Result<u64, StoreError> {
        let mut rows = self.attendance.lock().unwrap();
        let id = rows.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        rows.push(AttendanceRecord {
            id,
            name: record.name.clone(),
            date_val: record.date_val,
            month_val: record.month_val.clone(),
            year_val: record.year_val.clone(),
            day_val: record.day_val.clone(),
            check_in: Some(record.check_in.clone()),
            check_out: None,
            work_hours: None,
            ot_hours: None,
            remark: None,
            absent: None,
        });
        Ok(id)
    }

    async fn get(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .attendance
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn find_by(
        &self,
        name: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self
            .attendance
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name == name && r.date_val == date)
            .min_by_key(|r| r.id)
            .cloned())
    }

    async fn find_open_shifts_before(
        &self,
        name: &str,
        excluding: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self
            .attendance
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name == name && r.check_out.is_none() && r.date_val != excluding)
            .cloned()
            .collect())
    }

    async fn update(&self, id: u64, patch: &AttendancePatch) -> Result<(), StoreError> {
        let mut rows = self.attendance.lock().unwrap();
        let record = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))?;
        patch.apply(record);
        Ok(())
    }

    async fn list_for_employee(
        &self,
        name: &str,
        period: &Period,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut rows: Vec<_> = self
            .attendance
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.name == name && period.contains(r))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.date_val, r.id));
        Ok(rows)
    }
}

#[async_trait]
impl StaffStore for MemoryStore {
    async fn find_user(&self, name: &str) -> Result<Option<StaffUser>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.name == name)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<StaffUser>, StoreError> {
        let mut users = self.users.lock().unwrap().clone();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(users)
    }

    async fn upsert_user(
        &self,
        name: &str,
        pin_hash: &str,
        role: Role,
    ) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.name == name) {
            user.pin_hash = pin_hash.to_string();
            user.role = role.to_string();
            return Ok(false);
        }
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(StaffUser {
            id,
            name: name.to_string(),
            pin_hash: pin_hash.to_string(),
            role: role.to_string(),
        });
        Ok(true)
    }

    async fn delete_user(&self, name: &str) -> Result<bool, StoreError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.name != name);
        Ok(users.len() < before)
    }

    async fn count_role(&self, role: Role) -> Result<i64, StoreError> {
        let tag = role.to_string();
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.role == tag)
            .count() as i64)
    }

    async fn save_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        _expires_at: i64,
    ) -> Result<(), StoreError> {
        self.refresh_tokens
            .lock()
            .unwrap()
            .push((user_id, jti.to_string(), false));
        Ok(())
    }

    async fn consume_refresh_token(&self, jti: &str) -> Result<Option<u64>, StoreError> {
        let mut tokens = self.refresh_tokens.lock().unwrap();
        match tokens.iter_mut().find(|(_, j, revoked)| j == jti && !*revoked) {
            Some((user_id, _, revoked)) => {
                *revoked = true;
                Ok(Some(*user_id))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl EmployeeConfigStore for MemoryStore {
    async fn get_config(&self, name: &str) -> Result<Option<EmployeeConfig>, StoreError> {
        Ok(self.configs.lock().unwrap().get(name).cloned())
    }

    async fn upsert_config(&self, config: &EmployeeConfig) -> Result<(), StoreError> {
        self.configs
            .lock()
            .unwrap()
            .insert(config.name.clone(), config.clone());
        Ok(())
    }
}
