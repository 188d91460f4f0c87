//! Thread moderation actions.
//!
//! Each action takes the acting user and the thread as currently loaded,
//! re-checks the relevant state, and returns whether a change was applied.
//! The event insert and the partial save share one transaction; a failure
//! in either rolls both back.

use super::{record_event, synchronize_thread};
use crate::orm::posts;
use crate::orm::threads::{self, ThreadWeight};
use crate::user::Profile;
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, DatabaseConnection, DatabaseTransaction, DbErr,
    QueryFilter, Set, TransactionTrait,
};
use serde_json::json;

pub async fn announce_thread(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
) -> Result<bool, DbErr> {
    if thread.weight == ThreadWeight::Announcement {
        return Ok(false);
    }

    let txn = db.begin().await?;

    record_event(
        &txn,
        user,
        thread,
        "star",
        format!("{} turned thread into an announcement.", user.name),
        json!({ "user": user.name }),
    )
    .await?;

    let mut active: threads::ActiveModel = thread.clone().into();
    active.weight = Set(ThreadWeight::Announcement);
    active.has_events = Set(true);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(true)
}

pub async fn pin_thread(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
) -> Result<bool, DbErr> {
    if thread.weight == ThreadWeight::Pinned {
        return Ok(false);
    }

    let txn = db.begin().await?;

    record_event(
        &txn,
        user,
        thread,
        "bookmark",
        format!("{} pinned thread.", user.name),
        json!({ "user": user.name }),
    )
    .await?;

    let mut active: threads::ActiveModel = thread.clone().into();
    active.weight = Set(ThreadWeight::Pinned);
    active.has_events = Set(true);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(true)
}

pub async fn remove_thread_weight(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
) -> Result<bool, DbErr> {
    if thread.weight == ThreadWeight::Normal {
        return Ok(false);
    }

    let txn = db.begin().await?;

    record_event(
        &txn,
        user,
        thread,
        "circle",
        format!("{} removed thread weight.", user.name),
        json!({ "user": user.name }),
    )
    .await?;

    let mut active: threads::ActiveModel = thread.clone().into();
    active.weight = Set(ThreadWeight::Normal);
    active.has_events = Set(true);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(true)
}

pub async fn move_thread(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
    new_category: &crate::orm::categories::Model,
) -> Result<bool, DbErr> {
    if thread.category_id == new_category.id {
        return Ok(false);
    }

    let txn = db.begin().await?;

    let old_category = crate::orm::categories::Entity::find_by_id(thread.category_id)
        .one(&txn)
        .await?
        .map(|c| c.name)
        .unwrap_or_default();

    record_event(
        &txn,
        user,
        thread,
        "arrow-right",
        format!("{} moved thread from {}.", user.name, old_category),
        json!({ "user": user.name, "category": old_category }),
    )
    .await?;

    let mut active: threads::ActiveModel = thread.clone().into();
    active.category_id = Set(new_category.id);
    active.has_events = Set(true);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(true)
}

/// Merges `other_thread` into `thread` and deletes it.
///
/// Unlike the state-checked actions this one always applies; the source
/// thread ceases to exist, so there is no satisfied state to re-invoke on.
pub async fn merge_thread(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
    other_thread: &threads::Model,
) -> Result<bool, DbErr> {
    let txn = db.begin().await?;

    record_event(
        &txn,
        user,
        thread,
        "arrow-right",
        format!("{} merged in {}.", user.name, other_thread.title),
        json!({ "user": user.name, "thread": other_thread.title }),
    )
    .await?;

    // Reparent every post from the source thread, oldest ordering is
    // preserved by created_at.
    posts::Entity::update_many()
        .col_expr(posts::Column::ThreadId, Expr::value(thread.id))
        .filter(posts::Column::ThreadId.eq(other_thread.id))
        .exec(&txn)
        .await?;

    threads::Entity::delete_by_id(other_thread.id)
        .exec(&txn)
        .await?;

    let mut active: threads::ActiveModel = thread.clone().into();
    active.has_events = Set(true);
    active.update(&txn).await?;

    synchronize_thread(&txn, thread.id).await?;

    txn.commit().await?;
    Ok(true)
}

pub async fn approve_thread(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
) -> Result<bool, DbErr> {
    if !thread.is_moderated {
        return Ok(false);
    }

    let txn = db.begin().await?;

    record_event(
        &txn,
        user,
        thread,
        "check",
        format!("{} approved thread.", user.name),
        json!({ "user": user.name }),
    )
    .await?;

    if let Some(first_post) = get_first_post(&txn, thread).await? {
        let mut post: posts::ActiveModel = first_post.into();
        post.is_moderated = Set(false);
        post.update(&txn).await?;
    }

    let mut active: threads::ActiveModel = thread.clone().into();
    active.is_moderated = Set(false);
    active.has_events = Set(true);
    active.update(&txn).await?;

    synchronize_thread(&txn, thread.id).await?;

    txn.commit().await?;
    Ok(true)
}

pub async fn open_thread(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
) -> Result<bool, DbErr> {
    if !thread.is_closed {
        return Ok(false);
    }

    let txn = db.begin().await?;

    record_event(
        &txn,
        user,
        thread,
        "unlock-alt",
        format!("{} opened thread.", user.name),
        json!({ "user": user.name }),
    )
    .await?;

    let mut active: threads::ActiveModel = thread.clone().into();
    active.is_closed = Set(false);
    active.has_events = Set(true);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(true)
}

pub async fn close_thread(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
) -> Result<bool, DbErr> {
    if thread.is_closed {
        return Ok(false);
    }

    let txn = db.begin().await?;

    record_event(
        &txn,
        user,
        thread,
        "lock",
        format!("{} closed thread.", user.name),
        json!({ "user": user.name }),
    )
    .await?;

    let mut active: threads::ActiveModel = thread.clone().into();
    active.is_closed = Set(true);
    active.has_events = Set(true);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(true)
}

pub async fn hide_thread(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
) -> Result<bool, DbErr> {
    if thread.is_hidden {
        return Ok(false);
    }

    let txn = db.begin().await?;

    record_event(
        &txn,
        user,
        thread,
        "eye-slash",
        format!("{} hidden thread.", user.name),
        json!({ "user": user.name }),
    )
    .await?;

    if let Some(first_post) = get_first_post(&txn, thread).await? {
        let mut post: posts::ActiveModel = first_post.into();
        post.is_hidden = Set(true);
        post.hidden_by_id = Set(Some(user.id));
        post.hidden_by_name = Set(Some(user.name.clone()));
        post.hidden_by_slug = Set(Some(user.slug.clone()));
        post.hidden_on = Set(Some(Utc::now().naive_utc()));
        post.update(&txn).await?;
    }

    let mut active: threads::ActiveModel = thread.clone().into();
    active.is_hidden = Set(true);
    active.has_events = Set(true);
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(true)
}

/// Clears visibility flags set by [`hide_thread`]. The hide metadata on the
/// first post and the audit trail are left intact.
pub async fn unhide_thread(
    db: &DatabaseConnection,
    user: &Profile,
    thread: &threads::Model,
) -> Result<bool, DbErr> {
    if !thread.is_hidden {
        return Ok(false);
    }

    let txn = db.begin().await?;

    record_event(
        &txn,
        user,
        thread,
        "eye",
        format!("{} made thread visible.", user.name),
        json!({ "user": user.name }),
    )
    .await?;

    if let Some(first_post) = get_first_post(&txn, thread).await? {
        let mut post: posts::ActiveModel = first_post.into();
        post.is_hidden = Set(false);
        post.update(&txn).await?;
    }

    let mut active: threads::ActiveModel = thread.clone().into();
    active.is_hidden = Set(false);
    active.has_events = Set(true);
    active.update(&txn).await?;

    synchronize_thread(&txn, thread.id).await?;

    txn.commit().await?;
    Ok(true)
}

/// Hard-deletes a thread. Posts and events go with it; no event is recorded
/// because the target it would hang from is gone.
pub async fn delete_thread(
    db: &DatabaseConnection,
    _user: &Profile,
    thread: &threads::Model,
) -> Result<bool, DbErr> {
    threads::Entity::delete_by_id(thread.id).exec(db).await?;
    Ok(true)
}

async fn get_first_post(
    txn: &DatabaseTransaction,
    thread: &threads::Model,
) -> Result<Option<posts::Model>, DbErr> {
    match thread.first_post_id {
        Some(post_id) => posts::Entity::find_by_id(post_id).one(txn).await,
        None => Ok(None),
    }
}
