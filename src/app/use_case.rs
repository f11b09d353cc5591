pub mod users {
    use crate::{
        app::resource::{CreateUserForm, PatchUserForm, ReplaceUserForm, UserView},
        domain::{
            datatype::image,
            entity::{NewUser, Role, UserPatch, UserReplacement},
            service::{CityResolver, UserStore},
        },
        error::merge::MergeError,
    };

    fn parse_role(value: &str) -> Result<Role, MergeError> {
        Role::parse(value).map_err(|err| MergeError::InvalidRole(err.0))
    }

    /// CREATE merge policy: builds a user with no identity, resolves the
    /// city when given and falls back to the packaged default image when no
    /// upload came in. Role validation happens before any store call.
    pub async fn create_user<S, C>(
        store: &S,
        cities: &C,
        form: CreateUserForm,
    ) -> Result<i32, MergeError>
    where
        S: UserStore,
        C: CityResolver,
    {
        let role = parse_role(&form.role)?;

        let city = match form.city_id {
            Some(city_id) => Some(cities.resolve(city_id).await?),
            None => None,
        };

        let image = image::resolve_upload(form.image).await?;

        let user = NewUser {
            username: form.username,
            email: form.email,
            password: form.password,
            role,
            phone_number: form.phone_number,
            address: form.address,
            city,
            postal_code: form.postal_code,
            image,
        };

        let user_id = store.create(user).await?;
        tracing::info!(user_id, "user created");
        Ok(user_id)
    }

    /// REPLACE merge policy: every non-image field is overwritten, the city
    /// is resolved unconditionally and an absent upload leaves the stored
    /// image untouched. No default-image fallback on this path.
    pub async fn replace_user<S, C>(
        store: &S,
        cities: &C,
        user_id: i32,
        form: ReplaceUserForm,
    ) -> Result<i32, MergeError>
    where
        S: UserStore,
        C: CityResolver,
    {
        let role = parse_role(&form.role)?;
        let city = cities.resolve(form.city_id).await?;
        let image = form.image.filter(|bytes| !bytes.is_empty());

        let user = UserReplacement {
            user_id,
            username: form.username,
            email: form.email,
            password: form.password,
            role,
            phone_number: form.phone_number,
            address: form.address,
            city,
            postal_code: form.postal_code,
            image,
        };

        let user = store.replace(user).await?;
        tracing::info!(user_id = user.user_id, "user replaced");
        Ok(user.user_id)
    }

    /// PATCH merge policy: only supplied fields reach the store, which
    /// merges them field-by-field into the persisted record.
    pub async fn patch_user<S, C>(
        store: &S,
        cities: &C,
        user_id: i32,
        form: PatchUserForm,
    ) -> Result<i32, MergeError>
    where
        S: UserStore,
        C: CityResolver,
    {
        let role = match form.role.as_deref() {
            Some(value) => Some(parse_role(value)?),
            None => None,
        };

        let city = match form.city_id {
            Some(city_id) => Some(cities.resolve(city_id).await?),
            None => None,
        };

        let patch = UserPatch {
            user_id,
            username: form.username,
            email: form.email,
            password: form.password,
            role,
            phone_number: form.phone_number,
            address: form.address,
            city,
            postal_code: form.postal_code,
            image: form.image.filter(|bytes| !bytes.is_empty()),
        };

        let user = store.patch(patch).await?;
        tracing::info!(user_id = user.user_id, "user patched");
        Ok(user.user_id)
    }

    pub async fn delete_user<S: UserStore>(store: &S, user_id: i32) -> Result<(), MergeError> {
        store.delete(user_id).await?;
        tracing::info!(user_id, "user deleted");
        Ok(())
    }

    pub async fn find_user_by_id<S: UserStore>(
        store: &S,
        user_id: i32,
        as_dto: bool,
    ) -> Result<Option<UserView>, MergeError> {
        let user = store.find_by_id(user_id).await?;
        Ok(user.map(|user| UserView::project(user, as_dto)))
    }

    pub async fn find_user_by_username<S: UserStore>(
        store: &S,
        username: &str,
        as_dto: bool,
    ) -> Result<Option<UserView>, MergeError> {
        let user = store.find_by_username(username).await?;
        Ok(user.map(|user| UserView::project(user, as_dto)))
    }

    pub async fn find_user_by_email<S: UserStore>(
        store: &S,
        email: &str,
        as_dto: bool,
    ) -> Result<Option<UserView>, MergeError> {
        let user = store.find_by_email(email).await?;
        Ok(user.map(|user| UserView::project(user, as_dto)))
    }

    pub async fn list_users<S: UserStore>(
        store: &S,
        as_dto: bool,
    ) -> Result<Vec<UserView>, MergeError> {
        let users = store.find_all().await?;
        Ok(users
            .into_iter()
            .map(|user| UserView::project(user, as_dto))
            .collect())
    }
}
