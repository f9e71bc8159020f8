use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Name + PIN pair sent by the attendance kiosk and the HR login.
#[derive(Deserialize, ToSchema)]
pub struct CredentialsDto {
    #[schema(example = "Om")]
    pub name: String,
    #[schema(example = "1111")]
    pub pin: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
