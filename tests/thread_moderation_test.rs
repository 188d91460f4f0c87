//! Integration tests for the thread moderation actions.
//!
//! Every action is checked both ways: applying it mutates the documented
//! fields and records exactly one audit event; re-applying it to a thread
//! already in the target state is a no-op that records nothing.
mod common;

use common::{database::*, fixtures::*};
use sea_orm::{entity::*, query::*, ActiveValue::Set, DatabaseConnection, QueryFilter};
use serial_test::serial;
use stoa::moderation::threads as moderation;
use stoa::orm::{posts, thread_events, threads};
use stoa::orm::threads::ThreadWeight;

async fn refetch_thread(db: &DatabaseConnection, id: i32) -> threads::Model {
    threads::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("Failed to fetch thread")
        .expect("Thread not found")
}

async fn events_for(db: &DatabaseConnection, thread_id: i32) -> Vec<thread_events::Model> {
    thread_events::Entity::find()
        .filter(thread_events::Column::ThreadId.eq(thread_id))
        .order_by_asc(thread_events::Column::CreatedAt)
        .all(db)
        .await
        .expect("Failed to fetch events")
}

#[actix_rt::test]
#[serial]
async fn test_pin_thread_is_idempotent() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "mod").await.expect("user");
    let moderator = profile_for(&user);
    let category = create_test_category(&db, "General", 1).await.expect("category");
    let thread = create_test_thread(&db, &category, &user, "Pin me")
        .await
        .expect("thread");

    let changed = moderation::pin_thread(&db, &moderator, &thread)
        .await
        .expect("pin failed");
    assert!(changed, "Pinning a normal thread should apply");

    let thread = refetch_thread(&db, thread.id).await;
    assert_eq!(thread.weight, ThreadWeight::Pinned);
    assert!(thread.has_events, "Event flag should be set");

    let events = events_for(&db, thread.id).await;
    assert_eq!(events.len(), 1, "Exactly one event should be recorded");
    assert_eq!(events[0].icon, "bookmark");
    assert_eq!(events[0].author_name, "mod");

    // Second invocation is a no-op.
    let changed = moderation::pin_thread(&db, &moderator, &thread)
        .await
        .expect("pin failed");
    assert!(!changed, "Pinning a pinned thread should be a no-op");
    assert_eq!(events_for(&db, thread.id).await.len(), 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_announce_and_remove_weight() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "mod").await.expect("user");
    let moderator = profile_for(&user);
    let category = create_test_category(&db, "General", 1).await.expect("category");
    let thread = create_test_thread(&db, &category, &user, "Big news")
        .await
        .expect("thread");

    // Removing weight from a normal thread does nothing.
    let changed = moderation::remove_thread_weight(&db, &moderator, &thread)
        .await
        .expect("remove weight failed");
    assert!(!changed);
    assert!(events_for(&db, thread.id).await.is_empty());

    let changed = moderation::announce_thread(&db, &moderator, &thread)
        .await
        .expect("announce failed");
    assert!(changed);

    let thread = refetch_thread(&db, thread.id).await;
    assert_eq!(thread.weight, ThreadWeight::Announcement);

    // Announcing again is a no-op.
    let changed = moderation::announce_thread(&db, &moderator, &thread)
        .await
        .expect("announce failed");
    assert!(!changed);

    let changed = moderation::remove_thread_weight(&db, &moderator, &thread)
        .await
        .expect("remove weight failed");
    assert!(changed);

    let thread = refetch_thread(&db, thread.id).await;
    assert_eq!(thread.weight, ThreadWeight::Normal);

    let events = events_for(&db, thread.id).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].icon, "star");
    assert_eq!(events[1].icon, "circle");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_close_and_open_thread() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "mod").await.expect("user");
    let moderator = profile_for(&user);
    let category = create_test_category(&db, "General", 1).await.expect("category");
    let thread = create_test_thread(&db, &category, &user, "Argument")
        .await
        .expect("thread");

    // Opening an open thread is a no-op.
    let changed = moderation::open_thread(&db, &moderator, &thread)
        .await
        .expect("open failed");
    assert!(!changed);
    assert!(events_for(&db, thread.id).await.is_empty());

    let changed = moderation::close_thread(&db, &moderator, &thread)
        .await
        .expect("close failed");
    assert!(changed);

    let thread = refetch_thread(&db, thread.id).await;
    assert!(thread.is_closed);
    // Only the documented fields changed.
    assert_eq!(thread.weight, ThreadWeight::Normal);
    assert!(!thread.is_hidden);
    assert!(!thread.is_moderated);

    let changed = moderation::close_thread(&db, &moderator, &thread)
        .await
        .expect("close failed");
    assert!(!changed, "Closing a closed thread should be a no-op");

    let changed = moderation::open_thread(&db, &moderator, &thread)
        .await
        .expect("open failed");
    assert!(changed);
    assert!(!refetch_thread(&db, thread.id).await.is_closed);

    let events = events_for(&db, thread.id).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].icon, "lock");
    assert_eq!(events[1].icon, "unlock-alt");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_hide_sets_first_post_metadata() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "janitor").await.expect("user");
    let moderator = profile_for(&user);
    let category = create_test_category(&db, "General", 1).await.expect("category");
    let thread = create_test_thread(&db, &category, &user, "Spam probably")
        .await
        .expect("thread");

    let changed = moderation::hide_thread(&db, &moderator, &thread)
        .await
        .expect("hide failed");
    assert!(changed);

    let thread = refetch_thread(&db, thread.id).await;
    assert!(thread.is_hidden);

    let first_post = posts::Entity::find_by_id(thread.first_post_id.unwrap())
        .one(&db)
        .await
        .expect("Failed to fetch post")
        .expect("Post not found");
    assert!(first_post.is_hidden);
    assert_eq!(first_post.hidden_by_id, Some(user.id));
    assert_eq!(first_post.hidden_by_name.as_deref(), Some("janitor"));
    assert_eq!(first_post.hidden_by_slug.as_deref(), Some("janitor"));
    assert!(first_post.hidden_on.is_some());

    let events = events_for(&db, thread.id).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].icon, "eye-slash");

    // Hiding a hidden thread is a no-op.
    let changed = moderation::hide_thread(&db, &moderator, &thread)
        .await
        .expect("hide failed");
    assert!(!changed);
    assert_eq!(events_for(&db, thread.id).await.len(), 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_unhide_keeps_hide_metadata_and_audit_trail() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "janitor").await.expect("user");
    let moderator = profile_for(&user);
    let category = create_test_category(&db, "General", 1).await.expect("category");
    let thread = create_test_thread(&db, &category, &user, "False alarm")
        .await
        .expect("thread");

    moderation::hide_thread(&db, &moderator, &thread)
        .await
        .expect("hide failed");
    let thread = refetch_thread(&db, thread.id).await;

    let changed = moderation::unhide_thread(&db, &moderator, &thread)
        .await
        .expect("unhide failed");
    assert!(changed);

    let thread = refetch_thread(&db, thread.id).await;
    assert!(!thread.is_hidden);

    // Visibility flags clear; the hide metadata stays for the record.
    let first_post = posts::Entity::find_by_id(thread.first_post_id.unwrap())
        .one(&db)
        .await
        .expect("Failed to fetch post")
        .expect("Post not found");
    assert!(!first_post.is_hidden);
    assert_eq!(first_post.hidden_by_name.as_deref(), Some("janitor"));
    assert!(first_post.hidden_on.is_some());

    // Both actions remain in the audit trail.
    let events = events_for(&db, thread.id).await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].icon, "eye-slash");
    assert_eq!(events[1].icon, "eye");

    // Unhiding a visible thread is a no-op.
    let changed = moderation::unhide_thread(&db, &moderator, &thread)
        .await
        .expect("unhide failed");
    assert!(!changed);
    assert_eq!(events_for(&db, thread.id).await.len(), 2);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_approve_thread_clears_moderation_flags() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "mod").await.expect("user");
    let moderator = profile_for(&user);
    let category = create_test_category(&db, "General", 1).await.expect("category");
    let thread = create_test_thread(&db, &category, &user, "First post!")
        .await
        .expect("thread");

    // Flag the thread and its first post as awaiting approval.
    let mut active: threads::ActiveModel = thread.clone().into();
    active.is_moderated = Set(true);
    let thread = active.update(&db).await.expect("Failed to flag thread");

    let mut active: posts::ActiveModel = posts::Entity::find_by_id(thread.first_post_id.unwrap())
        .one(&db)
        .await
        .expect("Failed to fetch post")
        .expect("Post not found")
        .into();
    active.is_moderated = Set(true);
    active.update(&db).await.expect("Failed to flag post");

    let changed = moderation::approve_thread(&db, &moderator, &thread)
        .await
        .expect("approve failed");
    assert!(changed);

    let thread = refetch_thread(&db, thread.id).await;
    assert!(!thread.is_moderated);
    assert!(!thread.is_closed, "Approval should not touch is_closed");

    let first_post = posts::Entity::find_by_id(thread.first_post_id.unwrap())
        .one(&db)
        .await
        .expect("Failed to fetch post")
        .expect("Post not found");
    assert!(!first_post.is_moderated);

    let events = events_for(&db, thread.id).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].icon, "check");

    // Approving an approved thread is a no-op.
    let changed = moderation::approve_thread(&db, &moderator, &thread)
        .await
        .expect("approve failed");
    assert!(!changed);
    assert_eq!(events_for(&db, thread.id).await.len(), 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_move_thread_between_categories() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "mod").await.expect("user");
    let moderator = profile_for(&user);
    let general = create_test_category(&db, "General", 1).await.expect("category");
    let offtopic = create_test_category(&db, "Off Topic", 1).await.expect("category");
    let thread = create_test_thread(&db, &general, &user, "Wrong place")
        .await
        .expect("thread");

    // Moving to the category it is already in does nothing.
    let changed = moderation::move_thread(&db, &moderator, &thread, &general)
        .await
        .expect("move failed");
    assert!(!changed);
    assert!(events_for(&db, thread.id).await.is_empty());

    let changed = moderation::move_thread(&db, &moderator, &thread, &offtopic)
        .await
        .expect("move failed");
    assert!(changed);

    let thread = refetch_thread(&db, thread.id).await;
    assert_eq!(thread.category_id, offtopic.id);

    let events = events_for(&db, thread.id).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].icon, "arrow-right");
    assert!(
        events[0].message.contains("General"),
        "Event should name the old category"
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_merge_thread_moves_posts_and_deletes_source() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "mod").await.expect("user");
    let moderator = profile_for(&user);
    let category = create_test_category(&db, "General", 1).await.expect("category");
    let target = create_test_thread(&db, &category, &user, "Original")
        .await
        .expect("thread");
    let source = create_test_thread(&db, &category, &user, "Duplicate")
        .await
        .expect("thread");
    create_test_reply(&db, &source, &user, "Me too.")
        .await
        .expect("reply");

    let changed = moderation::merge_thread(&db, &moderator, &target, &source)
        .await
        .expect("merge failed");
    assert!(changed, "Merge always applies");

    // The source thread is gone.
    assert!(threads::Entity::find_by_id(source.id)
        .one(&db)
        .await
        .expect("Failed to query")
        .is_none());

    // Its posts now live in the target and the counters follow.
    let target = refetch_thread(&db, target.id).await;
    assert_eq!(target.post_count, 3);

    let moved_posts = posts::Entity::find()
        .filter(posts::Column::ThreadId.eq(target.id))
        .all(&db)
        .await
        .expect("Failed to fetch posts");
    assert_eq!(moved_posts.len(), 3);

    let events = events_for(&db, target.id).await;
    assert_eq!(events.len(), 1);
    assert!(
        events[0].message.contains("Duplicate"),
        "Event should name the merged thread"
    );

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_delete_thread_removes_it() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "mod").await.expect("user");
    let moderator = profile_for(&user);
    let category = create_test_category(&db, "General", 1).await.expect("category");
    let thread = create_test_thread(&db, &category, &user, "Goodbye")
        .await
        .expect("thread");
    let first_post_id = thread.first_post_id.unwrap();

    let changed = moderation::delete_thread(&db, &moderator, &thread)
        .await
        .expect("delete failed");
    assert!(changed);

    assert!(threads::Entity::find_by_id(thread.id)
        .one(&db)
        .await
        .expect("Failed to query")
        .is_none());

    // Posts go with the thread.
    assert!(posts::Entity::find_by_id(first_post_id)
        .one(&db)
        .await
        .expect("Failed to query")
        .is_none());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_weighted_threads_sort_first() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let user = create_test_user(&db, "mod").await.expect("user");
    let moderator = profile_for(&user);
    let category = create_test_category(&db, "General", 1).await.expect("category");

    let regular = create_test_thread(&db, &category, &user, "Regular")
        .await
        .expect("thread");
    let pinned = create_test_thread(&db, &category, &user, "Pinned")
        .await
        .expect("thread");
    let announced = create_test_thread(&db, &category, &user, "Announced")
        .await
        .expect("thread");

    moderation::pin_thread(&db, &moderator, &pinned)
        .await
        .expect("pin failed");
    moderation::announce_thread(&db, &moderator, &announced)
        .await
        .expect("announce failed");

    let sorted = threads::Entity::find()
        .filter(threads::Column::CategoryId.eq(category.id))
        .order_by_desc(threads::Column::Weight)
        .order_by_desc(threads::Column::LastPostAt)
        .all(&db)
        .await
        .expect("Failed to fetch threads");

    assert_eq!(sorted.len(), 3);
    assert_eq!(sorted[0].id, announced.id, "Announcement sorts first");
    assert_eq!(sorted[1].id, pinned.id, "Pin sorts second");
    assert_eq!(sorted[2].id, regular.id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
