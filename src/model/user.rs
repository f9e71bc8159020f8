use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A row of the `users` table. `pin_hash` is an argon2 PHC string.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StaffUser {
    pub id: u64,
    pub name: String,
    #[serde(skip_serializing)]
    pub pin_hash: String,
    pub role: String,
}

/// What the staff listing exposes.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StaffEntry {
    #[schema(example = "Om")]
    pub name: String,
    #[schema(example = "staff")]
    pub role: String,
}

impl From<StaffUser> for StaffEntry {
    fn from(user: StaffUser) -> Self {
        Self {
            name: user.name,
            role: user.role,
        }
    }
}
