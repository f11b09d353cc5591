pub mod connection {
    use std::time::Duration;

    use crate::config::env_var;

    pub async fn create_pool() -> sqlx::PgPool {
        let dburl = env_var::get().database_url.clone();
        sqlx::postgres::PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .acquire_timeout(Duration::from_millis(1000))
            .idle_timeout(Duration::from_millis(1000 * 30))
            .max_lifetime(Duration::from_millis(1000 * 10))
            .connect(&dburl)
            .await
            .expect("Expect to create a database pool with a open connection")
    }
}

pub mod repository {
    use async_trait::async_trait;
    use futures::TryStreamExt;
    use sqlx::{postgres::PgRow, PgPool, QueryBuilder, Row};

    use crate::{
        domain::{
            entity::{CityRef, NewUser, Role, User, UserPatch, UserReplacement},
            service::{CityResolver, UserStore},
        },
        error::store::StoreError,
    };

    const USER_COLUMNS: &str = concat!(
        "user_id, username, email, password, role, ",
        "phone_number, address, city_id, postal_code, image",
    );

    fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = Role::parse(&role).map_err(|err| sqlx::Error::ColumnDecode {
            index: "role".into(),
            source: Box::new(err),
        })?;

        let city_id: Option<i32> = row.try_get("city_id")?;
        let password: String = row.try_get("password")?;

        Ok(User {
            user_id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password: password.into(),
            role,
            phone_number: row.try_get("phone_number")?,
            address: row.try_get("address")?,
            city: city_id.map(|city_id| CityRef { city_id }),
            postal_code: row.try_get("postal_code")?,
            image: row.try_get("image")?,
        })
    }

    #[derive(Clone)]
    pub struct PgUserStore {
        pool: PgPool,
    }

    impl PgUserStore {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }
    }

    #[async_trait]
    impl UserStore for PgUserStore {
        async fn create(&self, user: NewUser) -> Result<i32, StoreError> {
            let row = sqlx::query(concat!(
                "INSERT INTO users (username, email, password, role, ",
                "phone_number, address, city_id, postal_code, image) ",
                "VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING user_id",
            ))
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.password.expose())
            .bind(user.role.as_str())
            .bind(&user.phone_number)
            .bind(&user.address)
            .bind(user.city.map(|city| city.city_id))
            .bind(user.postal_code)
            .bind(&user.image)
            .fetch_one(&self.pool)
            .await?;

            Ok(row.try_get("user_id")?)
        }

        async fn replace(&self, user: UserReplacement) -> Result<User, StoreError> {
            // COALESCE keeps the stored image when no upload came in
            let row = sqlx::query(concat!(
                "UPDATE users SET username = $1, email = $2, password = $3, role = $4, ",
                "phone_number = $5, address = $6, city_id = $7, postal_code = $8, ",
                "image = COALESCE($9, image) WHERE user_id = $10 ",
                "RETURNING user_id, username, email, password, role, ",
                "phone_number, address, city_id, postal_code, image",
            ))
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.password.expose())
            .bind(user.role.as_str())
            .bind(&user.phone_number)
            .bind(&user.address)
            .bind(user.city.city_id)
            .bind(user.postal_code)
            .bind(user.image.as_deref())
            .bind(user.user_id)
            .fetch_optional(&self.pool)
            .await?;

            let row = row.ok_or(StoreError::NotFound)?;
            Ok(user_from_row(&row)?)
        }

        async fn patch(&self, patch: UserPatch) -> Result<User, StoreError> {
            if patch.is_empty() {
                return self
                    .find_by_id(patch.user_id)
                    .await?
                    .ok_or(StoreError::NotFound);
            }

            let mut qb = QueryBuilder::new("UPDATE users SET ");
            {
                let mut set = qb.separated(", ");
                if let Some(username) = &patch.username {
                    set.push("username = ");
                    set.push_bind_unseparated(username);
                }
                if let Some(email) = &patch.email {
                    set.push("email = ");
                    set.push_bind_unseparated(email);
                }
                if let Some(password) = &patch.password {
                    set.push("password = ");
                    set.push_bind_unseparated(password.expose());
                }
                if let Some(role) = &patch.role {
                    set.push("role = ");
                    set.push_bind_unseparated(role.as_str());
                }
                if let Some(phone_number) = &patch.phone_number {
                    set.push("phone_number = ");
                    set.push_bind_unseparated(phone_number);
                }
                if let Some(address) = &patch.address {
                    set.push("address = ");
                    set.push_bind_unseparated(address);
                }
                if let Some(city) = &patch.city {
                    set.push("city_id = ");
                    set.push_bind_unseparated(city.city_id);
                }
                if let Some(postal_code) = &patch.postal_code {
                    set.push("postal_code = ");
                    set.push_bind_unseparated(*postal_code);
                }
                if let Some(image) = &patch.image {
                    set.push("image = ");
                    set.push_bind_unseparated(image.as_slice());
                }
            }
            qb.push(" WHERE user_id = ");
            qb.push_bind(patch.user_id);
            qb.push(" RETURNING ");
            qb.push(USER_COLUMNS);

            let row = qb.build().fetch_optional(&self.pool).await?;
            let row = row.ok_or(StoreError::NotFound)?;
            Ok(user_from_row(&row)?)
        }

        async fn delete(&self, user_id: i32) -> Result<(), StoreError> {
            // deleting an already-deleted id is not an error at this layer
            sqlx::query("DELETE FROM users WHERE user_id = $1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            Ok(())
        }

        async fn find_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError> {
            let row = sqlx::query(concat!(
                "SELECT user_id, username, email, password, role, ",
                "phone_number, address, city_id, postal_code, image ",
                "FROM users WHERE user_id = $1",
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(|row| user_from_row(&row)).transpose()?)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
            let row = sqlx::query(concat!(
                "SELECT user_id, username, email, password, role, ",
                "phone_number, address, city_id, postal_code, image ",
                "FROM users WHERE username = $1",
            ))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(|row| user_from_row(&row)).transpose()?)
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
            let row = sqlx::query(concat!(
                "SELECT user_id, username, email, password, role, ",
                "phone_number, address, city_id, postal_code, image ",
                "FROM users WHERE email = $1",
            ))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.map(|row| user_from_row(&row)).transpose()?)
        }

        async fn find_all(&self) -> Result<Vec<User>, StoreError> {
            let mut rows = sqlx::query(concat!(
                "SELECT user_id, username, email, password, role, ",
                "phone_number, address, city_id, postal_code, image ",
                "FROM users ORDER BY user_id",
            ))
            .fetch(&self.pool);

            let mut users = Vec::new();
            while let Some(row) = rows.try_next().await? {
                users.push(user_from_row(&row)?);
            }

            Ok(users)
        }
    }

    #[derive(Clone)]
    pub struct PgCityResolver {
        pool: PgPool,
    }

    impl PgCityResolver {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }
    }

    #[async_trait]
    impl CityResolver for PgCityResolver {
        async fn resolve(&self, city_id: i32) -> Result<CityRef, StoreError> {
            let row = sqlx::query("SELECT city_id FROM cities WHERE city_id = $1")
                .bind(city_id)
                .fetch_optional(&self.pool)
                .await?;

            match row {
                Some(_) => Ok(CityRef { city_id }),
                None => Err(StoreError::NotFound),
            }
        }
    }
}
