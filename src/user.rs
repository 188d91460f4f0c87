//! User profile data shared across request handling.

use crate::db::get_db_pool;
use crate::orm::users;
use sea_orm::{entity::*, DbErr};

/// The slice of a user account that request handling and audit records need.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl From<users::Model> for Profile {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            slug: user.slug,
        }
    }
}

pub async fn get_profile_by_id(id: i32) -> Result<Option<Profile>, DbErr> {
    Ok(users::Entity::find_by_id(id)
        .one(get_db_pool())
        .await?
        .map(Profile::from))
}
