pub mod categories;
pub mod group_permissions;
pub mod groups;
pub mod posts;
pub mod thread_events;
pub mod threads;
pub mod user_groups;
pub mod users;
