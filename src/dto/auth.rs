use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    identity::{IdentityUser, TokenBundle},
    models::ShippingAddress,
};

#[derive(Deserialize, Debug, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub addresses: Option<Vec<ShippingAddress>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResult {
    pub session: Option<TokenBundle>,
    pub user: Option<IdentityUser>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: IdentityUser,
}
