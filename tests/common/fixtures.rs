//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use stoa::orm::{categories, posts, threads};
use stoa::slug::slugify;
use stoa::user::Profile;

pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
) -> Result<stoa::orm::users::Model, DbErr> {
    stoa::orm::users::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slugify(name)),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub fn profile_for(user: &stoa::orm::users::Model) -> Profile {
    Profile::from(user.clone())
}

pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
    level: i32,
) -> Result<categories::Model, DbErr> {
    categories::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slugify(name)),
        level: Set(level),
        thread_count: Set(0),
        post_count: Set(0),
        last_thread_id: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a thread with its first post already in place.
pub async fn create_test_thread(
    db: &DatabaseConnection,
    category: &categories::Model,
    user: &stoa::orm::users::Model,
    title: &str,
) -> Result<threads::Model, DbErr> {
    let now = Utc::now().naive_utc();

    let thread = threads::ActiveModel {
        category_id: Set(category.id),
        user_id: Set(Some(user.id)),
        title: Set(title.to_string()),
        slug: Set(slugify(title)),
        weight: Set(threads::ThreadWeight::Normal),
        is_closed: Set(false),
        is_hidden: Set(false),
        is_moderated: Set(false),
        has_events: Set(false),
        first_post_id: Set(None),
        post_count: Set(0),
        last_post_at: Set(Some(now)),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let first_post = posts::ActiveModel {
        thread_id: Set(thread.id),
        user_id: Set(Some(user.id)),
        poster_name: Set(user.name.clone()),
        content: Set("Opening post.".to_string()),
        is_hidden: Set(false),
        is_moderated: Set(false),
        hidden_by_id: Set(None),
        hidden_by_name: Set(None),
        hidden_by_slug: Set(None),
        hidden_on: Set(None),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let mut active: threads::ActiveModel = thread.into();
    active.first_post_id = Set(Some(first_post.id));
    active.post_count = Set(1);
    active.update(db).await
}

/// Add a reply to an existing thread.
pub async fn create_test_reply(
    db: &DatabaseConnection,
    thread: &threads::Model,
    user: &stoa::orm::users::Model,
    content: &str,
) -> Result<posts::Model, DbErr> {
    let post = posts::ActiveModel {
        thread_id: Set(thread.id),
        user_id: Set(Some(user.id)),
        poster_name: Set(user.name.clone()),
        content: Set(content.to_string()),
        is_hidden: Set(false),
        is_moderated: Set(false),
        hidden_by_id: Set(None),
        hidden_by_name: Set(None),
        hidden_by_slug: Set(None),
        hidden_on: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let mut active: threads::ActiveModel = thread.clone().into();
    active.post_count = Set(thread.post_count + 1);
    active.last_post_at = Set(Some(post.created_at));
    active.update(db).await?;

    Ok(post)
}
