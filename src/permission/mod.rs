//! Group-based permission tags.
//!
//! Permissions are dotted tags (`moderate.thread.pin`) granted to groups.
//! The whole table is small and read on every request, so it is loaded into
//! memory at startup and queried through [`PermissionData::can`].

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{group_permissions, user_groups};
use crate::user::Profile;
use dashmap::DashMap;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr, QueryFilter};
use std::collections::HashSet;

#[derive(Clone, Debug, Default)]
pub struct PermissionData {
    /// group id -> tags granted to that group
    group_tags: DashMap<i32, HashSet<String>>,
}

impl PermissionData {
    /// Accepts Client/Guest and permission tag for permission check.
    /// A client passes if any of its groups carries the tag.
    pub fn can(&self, client: &ClientCtx, tag: &str) -> bool {
        client.get_groups().iter().any(|group| {
            self.group_tags
                .get(group)
                .map(|tags| tags.contains(tag))
                .unwrap_or(false)
        })
    }

    pub fn grant(&self, group_id: i32, tag: &str) {
        self.group_tags
            .entry(group_id)
            .or_default()
            .insert(tag.to_string());
    }
}

/// Loads the permission table from the database.
pub async fn new() -> Result<PermissionData, DbErr> {
    let data = PermissionData::default();

    let rows = group_permissions::Entity::find().all(get_db_pool()).await?;
    let row_count = rows.len();
    for row in rows {
        data.grant(row.group_id, &row.tag);
    }

    log::info!("Loaded {} permission grants.", row_count);
    Ok(data)
}

/// Group ids for a client. Guests belong to no groups.
pub async fn get_group_ids_for_client(
    db: &DatabaseConnection,
    client: &Option<Profile>,
) -> Vec<i32> {
    let user = match client {
        Some(user) => user,
        None => return Vec::new(),
    };

    match user_groups::Entity::find()
        .filter(user_groups::Column::UserId.eq(user.id))
        .all(db)
        .await
    {
        Ok(rows) => rows.into_iter().map(|row| row.group_id).collect(),
        Err(err) => {
            log::error!("Group lookup failed for user {}: {}", user.id, err);
            Vec::new()
        }
    }
}
