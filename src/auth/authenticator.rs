use async_trait::async_trait;
use tracing::debug;

use super::password::verify_pin;
use crate::error::StoreError;
use crate::model::role::Role;
use crate::store::StaffStore;

/// Outcome of a credential check.
#[derive(Debug, Clone, PartialEq)]
pub struct Verification {
    pub valid: bool,
    pub user_id: Option<u64>,
    pub role: Option<Role>,
}

impl Verification {
    fn rejected() -> Self {
        Self {
            valid: false,
            user_id: None,
            role: None,
        }
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, name: &str, secret: &str) -> Result<Verification, StoreError>;
}

/// Checks a staff member's PIN against the stored argon2 hash.
pub struct PinAuthenticator<'a> {
    staff: &'a dyn StaffStore,
}

impl<'a> PinAuthenticator<'a> {
    pub fn new(staff: &'a dyn StaffStore) -> Self {
        Self { staff }
    }
}

#[async_trait]
impl<'a> CredentialVerifier for PinAuthenticator<'a> {
    async fn verify(&self, name: &str, secret: &str) -> Result<Verification, StoreError> {
        let Some(user) = self.staff.find_user(name).await? else {
            debug!(name, "credential check for unknown staff member");
            return Ok(Verification::rejected());
        };

        if !verify_pin(secret, &user.pin_hash) {
            debug!(name, "PIN mismatch");
            return Ok(Verification::rejected());
        }

        Ok(Verification {
            valid: true,
            user_id: Some(user.id),
            role: Role::from_tag(&user.role),
        })
    }
}
