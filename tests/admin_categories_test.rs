//! Integration tests for category management.
mod common;

use common::{database::*, fixtures::*};
use sea_orm::{entity::*, query::*, ActiveValue::Set, QueryFilter};
use serial_test::serial;
use stoa::orm::{categories, threads};
use stoa::slug::slugify;

#[actix_rt::test]
#[serial]
async fn test_category_crud_roundtrip() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let category = create_test_category(&db, "Rust & Systems", 1)
        .await
        .expect("Failed to create category");
    assert_eq!(category.slug, "rust-systems");

    // Rename; the slug follows the name the way the admin form writes it.
    let mut active: categories::ActiveModel = category.into();
    active.name = Set("Systems Programming".to_string());
    active.slug = Set(slugify("Systems Programming"));
    let category = active.update(&db).await.expect("Failed to update");
    assert_eq!(category.slug, "systems-programming");

    categories::Entity::delete_by_id(category.id)
        .exec(&db)
        .await
        .expect("Failed to delete");
    assert!(categories::Entity::find_by_id(category.id)
        .one(&db)
        .await
        .expect("Failed to query")
        .is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_category_thread_count_guards_deletion() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "author").await.expect("user");
    let category = create_test_category(&db, "Busy", 1)
        .await
        .expect("category");
    create_test_thread(&db, &category, &user, "Occupied")
        .await
        .expect("thread");

    // The delete screen refuses while this is non-zero.
    let thread_count = threads::Entity::find()
        .filter(threads::Column::CategoryId.eq(category.id))
        .count(&db)
        .await
        .expect("Failed to count");
    assert_eq!(thread_count, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
