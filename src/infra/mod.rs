pub mod controller;
pub mod database;

pub mod router {
    use salvo::{logging::Logger, Router};
    use sqlx::PgPool;

    use super::{
        controller::*,
        database::repository::{PgCityResolver, PgUserStore},
    };

    pub fn app(pool: &PgPool) -> Router {
        let store = PgUserStore::new(pool.clone());
        let cities = PgCityResolver::new(pool.clone());

        Router::new()
            .push(
                Router::with_path("protected/api/users")
                    .post(CreateUserController::new(store.clone(), cities.clone()))
                    .get(ListUsersController::new(store.clone()))
                    .push(
                        Router::with_path("username/<username>")
                            .get(GetUserByUsernameController::new(store.clone())),
                    )
                    .push(
                        Router::with_path("email/<email>")
                            .get(GetUserByEmailController::new(store.clone())),
                    )
                    .push(
                        Router::with_path("<id:num>")
                            .get(GetUserByIdController::new(store.clone()))
                            .put(ReplaceUserController::new(store.clone(), cities.clone()))
                            .patch(PatchUserController::new(store.clone(), cities))
                            .delete(DeleteUserController::new(store)),
                    ),
            )
            .hoop(Logger)
    }
}
