//! SeaORM Entity for threads table

use sea_orm::entity::prelude::*;

/// Thread priority tier. Announcements sort above pins, pins above normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum ThreadWeight {
    #[sea_orm(num_value = 0)]
    Normal,
    #[sea_orm(num_value = 1)]
    Pinned,
    #[sea_orm(num_value = 2)]
    Announcement,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "threads")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category_id: i32,
    pub user_id: Option<i32>,
    pub title: String,
    pub slug: String,
    pub weight: ThreadWeight,
    pub is_closed: bool,
    pub is_hidden: bool,
    /// Awaiting moderator approval.
    pub is_moderated: bool,
    /// Set whenever an audit event is recorded against this thread.
    pub has_events: bool,
    pub first_post_id: Option<i32>,
    pub post_count: i32,
    pub last_post_at: Option<DateTime>,
    pub created_at: DateTime,
}

impl Model {
    pub fn is_pinned(&self) -> bool {
        self.weight == ThreadWeight::Pinned
    }

    pub fn is_announcement(&self) -> bool {
        self.weight == ThreadWeight::Announcement
    }

    pub fn has_weight(&self) -> bool {
        self.weight != ThreadWeight::Normal
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    User,
    #[sea_orm(has_many = "super::posts::Entity")]
    Posts,
    #[sea_orm(has_many = "super::thread_events::Entity")]
    Events,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::thread_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
