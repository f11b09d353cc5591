use serde::Serialize;

use crate::domain::datatype::credential::Password;
use crate::domain::entity::{CityRef, Role, User};

/// Create payload: account fields required, descriptive fields optional.
/// The transport layer already applied the "adopter" role default.
#[derive(Debug, Clone)]
pub struct CreateUserForm {
    pub username: String,
    pub password: Password,
    pub email: String,
    pub role: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city_id: Option<i32>,
    pub postal_code: Option<i32>,
    pub image: Option<Vec<u8>>,
}

/// Full-replace payload: every non-image field re-supplied.
#[derive(Debug, Clone)]
pub struct ReplaceUserForm {
    pub username: String,
    pub password: Password,
    pub email: String,
    pub role: String,
    pub phone_number: String,
    pub address: String,
    pub city_id: i32,
    pub postal_code: i32,
    pub image: Option<Vec<u8>>,
}

/// Partial-update payload: absent fields must survive the merge untouched.
#[derive(Debug, Clone, Default)]
pub struct PatchUserForm {
    pub username: Option<String>,
    pub password: Option<Password>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city_id: Option<i32>,
    pub postal_code: Option<i32>,
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserMutated {
    pub user_id: i32,
}

/// Public projection of a user: no credential, no image bytes.
#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<CityRef>,
    pub postal_code: Option<i32>,
}

/// Rendered form of a looked-up user, selected by the caller's `dto` flag.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum UserView {
    Full(User),
    Public(UserDto),
}

impl UserView {
    pub fn project(user: User, as_dto: bool) -> Self {
        if as_dto {
            Self::Public(user.into())
        } else {
            Self::Full(user)
        }
    }
}
