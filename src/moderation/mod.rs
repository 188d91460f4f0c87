//! Moderation actions and their audit trail.
//!
//! Every state-changing action in this module follows the same contract:
//! if the thread already satisfies the target state the call is a no-op
//! returning `false`; otherwise exactly one mutation, one audit event, and
//! one partial save happen inside a single transaction and the call returns
//! `true`.

pub mod threads;

use crate::orm::{posts, thread_events, threads as thread_entities};
use crate::user::Profile;
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, DatabaseTransaction, DbErr, FromQueryResult, QueryFilter,
    Set,
};

/// Inserts one append-only audit record against a thread.
///
/// The caller is responsible for persisting `has_events` on the thread in
/// the same transaction; the flag and the event row must land together.
pub async fn record_event(
    txn: &DatabaseTransaction,
    user: &Profile,
    thread: &thread_entities::Model,
    icon: &str,
    message: String,
    args: serde_json::Value,
) -> Result<(), DbErr> {
    let event = thread_events::ActiveModel {
        thread_id: Set(thread.id),
        author_id: Set(Some(user.id)),
        author_name: Set(user.name.clone()),
        author_slug: Set(user.slug.clone()),
        icon: Set(icon.to_string()),
        message: Set(message),
        args: Set(Some(args)),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    thread_events::Entity::insert(event).exec(txn).await?;
    Ok(())
}

/// Recomputes a thread's derived columns from its posts.
///
/// Used after structural changes (merge, approve, unhide) where the set of
/// countable posts may have shifted. Updates `post_count`, `first_post_id`
/// and `last_post_at` only.
pub async fn synchronize_thread(txn: &DatabaseTransaction, thread_id: i32) -> Result<(), DbErr> {
    #[derive(Debug, FromQueryResult)]
    struct PostStamp {
        id: i32,
        created_at: chrono::NaiveDateTime,
    }

    let first_post = posts::Entity::find()
        .select_only()
        .column_as(posts::Column::Id, "id")
        .column_as(posts::Column::CreatedAt, "created_at")
        .filter(posts::Column::ThreadId.eq(thread_id))
        .order_by_asc(posts::Column::CreatedAt)
        .into_model::<PostStamp>()
        .one(txn)
        .await?;

    let last_post = posts::Entity::find()
        .select_only()
        .column_as(posts::Column::Id, "id")
        .column_as(posts::Column::CreatedAt, "created_at")
        .filter(posts::Column::ThreadId.eq(thread_id))
        .order_by_desc(posts::Column::CreatedAt)
        .into_model::<PostStamp>()
        .one(txn)
        .await?;

    let post_count = posts::Entity::find()
        .filter(posts::Column::ThreadId.eq(thread_id))
        .filter(posts::Column::IsModerated.eq(false))
        .count(txn)
        .await?;

    thread_entities::Entity::update_many()
        .col_expr(
            thread_entities::Column::PostCount,
            Expr::value(post_count as i32),
        )
        .col_expr(
            thread_entities::Column::FirstPostId,
            Expr::value(first_post.map(|p| p.id)),
        )
        .col_expr(
            thread_entities::Column::LastPostAt,
            Expr::value(last_post.map(|p| p.created_at)),
        )
        .filter(thread_entities::Column::Id.eq(thread_id))
        .exec(txn)
        .await?;

    Ok(())
}
