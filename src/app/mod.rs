pub mod resource;
pub mod use_case;

pub mod transform {
    pub mod user {
        use crate::{app::resource::UserDto, domain::entity::User};

        impl From<User> for UserDto {
            fn from(user: User) -> Self {
                Self {
                    user_id: user.user_id,
                    username: user.username,
                    email: user.email,
                    role: user.role,
                    phone_number: user.phone_number,
                    address: user.address,
                    city: user.city,
                    postal_code: user.postal_code,
                }
            }
        }
    }
}
