use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::domain::datatype::credential::Password;

/// Closed set of account roles on the adoption platform.
///
/// Parsed from the wire with [`Role::parse`]; an unknown value is rejected
/// before any merge is attempted.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display(fmt = "adopter")]
    Adopter,
    #[display(fmt = "shelter")]
    Shelter,
    #[display(fmt = "admin")]
    Admin,
}

pub const DEFAULT_ROLE: Role = Role::Adopter;

#[derive(Debug, Display, Clone)]
#[display(fmt = "unknown role: {_0}")]
pub struct UnknownRole(pub String);

impl std::error::Error for UnknownRole {}

impl Role {
    pub fn parse(value: &str) -> Result<Self, UnknownRole> {
        match value {
            "adopter" => Ok(Self::Adopter),
            "shelter" => Ok(Self::Shelter),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownRole(other.into())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Adopter => "adopter",
            Self::Shelter => "shelter",
            Self::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Reference to a City record, resolved by id through
/// [`CityResolver`](crate::domain::service::CityResolver). The city content
/// itself is never embedded in a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityRef {
    pub city_id: i32,
}

/// Persisted user account.
///
/// `image` is never empty once the record went through a create or a full
/// replace; the create path falls back to the packaged default picture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub password: Password,
    pub role: Role,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<CityRef>,
    pub postal_code: Option<i32>,
    pub image: Vec<u8>,
}

/// User under construction by the create path, before the store assigns an
/// identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: Password,
    pub role: Role,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<CityRef>,
    pub postal_code: Option<i32>,
    pub image: Vec<u8>,
}

/// Full overwrite of an existing user. Unlike the create path, every
/// non-image field is required here, descriptive ones included.
///
/// An absent `image` means the stored image is left untouched by the store
/// (no default fallback on replace).
#[derive(Debug, Clone, PartialEq)]
pub struct UserReplacement {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub password: Password,
    pub role: Role,
    pub phone_number: String,
    pub address: String,
    pub city: CityRef,
    pub postal_code: i32,
    pub image: Option<Vec<u8>>,
}

/// Sparse user mutation: only fields carrying `Some` reach the persisted
/// record, absent fields provably survive the merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub user_id: i32,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<Password>,
    pub role: Option<Role>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<CityRef>,
    pub postal_code: Option<i32>,
    pub image: Option<Vec<u8>>,
}

impl UserPatch {
    pub fn for_user(user_id: i32) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    /// A patch that carries nothing but the identity.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.role.is_none()
            && self.phone_number.is_none()
            && self.address.is_none()
            && self.city.is_none()
            && self.postal_code.is_none()
            && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn role_parses_every_member_of_the_enumeration() {
        assert_eq!(Role::parse("adopter").unwrap(), Role::Adopter);
        assert_eq!(Role::parse("shelter").unwrap(), Role::Shelter);
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
    }

    #[test]
    fn role_rejects_unknown_values() {
        let err = Role::parse("not-a-role").unwrap_err();
        assert_eq!(err.0, "not-a-role");
    }

    #[test]
    fn role_parse_is_case_sensitive() {
        assert!(Role::parse("Adopter").is_err());
    }

    #[test]
    fn empty_patch_reports_itself_empty() {
        let patch = UserPatch::for_user(7);
        assert!(patch.is_empty());

        let patch = UserPatch {
            username: Some("ada".into()),
            ..UserPatch::for_user(7)
        };
        assert!(!patch.is_empty());
    }
}
