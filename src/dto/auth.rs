use crate::domain;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for a login attempt. Displays as just the username so passwords never end
/// up in logs.
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{username}")]
#[cfg_attr(test, derive(Serialize))]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    #[schema(example = "doug_heffernan")]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl From<LoginRequest> for domain::user::UserCredentials {
    fn from(value: LoginRequest) -> Self {
        domain::user::UserCredentials {
            username: value.username,
            password: value.password,
        }
    }
}

/// DTO containing a freshly issued access token
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TokenResponse {
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> TokenResponse {
        TokenResponse {
            access_token,
            token_type: "bearer".to_owned(),
        }
    }
}
