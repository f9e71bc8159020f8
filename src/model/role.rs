use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Hr,
    Staff,
}

impl Role {
    pub fn from_tag(tag: &str) -> Option<Self> {
        tag.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_role_tags() {
        assert_eq!(Role::from_tag("hr"), Some(Role::Hr));
        assert_eq!(Role::from_tag(" Staff "), Some(Role::Staff));
        assert_eq!(Role::from_tag("admin"), None);
        assert_eq!(Role::Hr.to_string(), "hr");
    }
}
