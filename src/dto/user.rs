use crate::domain;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for a user's profile as returned on the API. Never carries password material.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TodoUser {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "doug_heffernan")]
    pub username: String,
    #[schema(example = "doug@example.com")]
    pub email: String,
}

impl From<domain::user::TodoUser> for TodoUser {
    fn from(value: domain::user::TodoUser) -> Self {
        TodoUser {
            id: value.id,
            username: value.username,
            email: value.email,
        }
    }
}

/// DTO for registering a new user via the API. Displays as just the username so
/// passwords never end up in logs.
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{username}")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewUser {
    #[validate(length(min = 3, max = 30))]
    #[schema(example = "doug_heffernan")]
    pub username: String,
    #[validate(email)]
    #[schema(example = "doug@example.com")]
    pub email: String,
    #[validate(length(min = 8, max = 72))]
    pub password: String,
}

impl From<NewUser> for domain::user::CreateUser {
    fn from(value: NewUser) -> Self {
        domain::user::CreateUser {
            username: value.username,
            email: value.email,
            password: value.password,
        }
    }
}

/// DTO containing the ID of a user that was created via the API.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct InsertedUser {
    #[schema(example = 10)]
    pub id: i32,
}
