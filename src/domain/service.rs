use async_trait::async_trait;

use crate::domain::entity::{CityRef, NewUser, User, UserPatch, UserReplacement};
use crate::error::store::StoreError;

/// Persistence seam for user accounts.
///
/// Uniqueness of `username` and `email` is enforced here, not pre-checked by
/// callers; a collision surfaces as [`StoreError::UniqueViolation`] carrying
/// the constraint identifier.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a new user and returns the assigned identity.
    async fn create(&self, user: NewUser) -> Result<i32, StoreError>;

    /// Overwrites every non-image field of an existing user. A `None` image
    /// leaves the stored image untouched.
    async fn replace(&self, user: UserReplacement) -> Result<User, StoreError>;

    /// Merges only the fields present in the patch into the stored record.
    /// A whole-record overwrite is not a valid implementation.
    async fn patch(&self, patch: UserPatch) -> Result<User, StoreError>;

    async fn delete(&self, user_id: i32) -> Result<(), StoreError>;

    async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_all(&self) -> Result<Vec<User>, StoreError>;
}

/// Lookup seam for City references.
///
/// The merger only attaches the resolved reference; what an unresolvable id
/// means is this collaborator's policy and its error is propagated as-is.
#[async_trait]
pub trait CityResolver: Send + Sync {
    async fn resolve(&self, city_id: i32) -> Result<CityRef, StoreError>;
}
