//! Shared plumbing for admin CRUD screens.
//!
//! Every admin screen resolves its target the same way (missing row turns
//! into a flash + redirect, never an error page), gates on the same kind of
//! permission tag, and list screens share the session-persisted ordering
//! and pagination behavior. Screens describe themselves through the traits
//! here and the handlers compose the free functions.

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::template::Paginator;
use crate::web::flash::flash_error;
use actix_session::Session;
use actix_web::HttpResponse;
use sea_orm::{entity::*, query::*, DbErr, EntityTrait, PrimaryKeyTrait, Select};

/// An admin screen working on one entity.
pub trait AdminScreen {
    type Entity: EntityTrait;

    /// Where flows on this screen bail out to.
    const ROOT_LINK: &'static str;
    /// Flashed when the requested row does not exist.
    const MESSAGE_404: &'static str;
    /// Permission tag gating the whole screen.
    const PERMISSION: &'static str;
}

/// A list screen with orderable, optionally paginated rows.
pub trait ListScreen: AdminScreen {
    /// Allowed orderings as (label, key) tuples. The first tuple is the
    /// fallback when the session holds nothing valid.
    const ORDERING: &'static [(&'static str, &'static str)];
    /// Rows per page; 0 disables pagination.
    const ITEMS_PER_PAGE: i32 = 0;

    fn order_query(query: Select<Self::Entity>, key: &str) -> Select<Self::Entity>;
}

pub fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header(("Location", location.to_owned()))
        .finish()
}

/// Gate a screen. Failure flashes and bounces to the admin dashboard
/// rather than presenting an error page.
pub fn check_screen_permission<S: AdminScreen>(
    client: &ClientCtx,
    session: &Session,
) -> Result<(), HttpResponse> {
    if client.is_user() && client.can(S::PERMISSION) {
        Ok(())
    } else {
        flash_error(session, "You can not use that part of the admin panel.");
        Err(see_other("/admin"))
    }
}

/// Fetch the screen's target row. A missing id flashes the screen's 404
/// message and bounces to its root link.
pub async fn get_target_or_redirect<S>(
    session: &Session,
    id: i32,
) -> Result<<S::Entity as EntityTrait>::Model, HttpResponse>
where
    S: AdminScreen,
    <<S::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType: From<i32>,
{
    match S::Entity::find_by_id(id.into()).one(get_db_pool()).await {
        Ok(Some(model)) => Ok(model),
        Ok(None) => {
            flash_error(session, S::MESSAGE_404);
            Err(see_other(S::ROOT_LINK))
        }
        Err(err) => {
            log::error!("Admin target lookup failed: {}", err);
            flash_error(session, "Database error.");
            Err(see_other(S::ROOT_LINK))
        }
    }
}

fn ordering_session_key<S: ListScreen>() -> String {
    format!(
        "admin_{}_order_by",
        S::ROOT_LINK.trim_matches('/').replace('/', "_")
    )
}

/// Persist a submitted ordering key in the session. Unknown keys flash an
/// error and leave the stored ordering untouched.
pub fn set_ordering<S: ListScreen>(session: &Session, new_order: &str) {
    if S::ORDERING.iter().any(|(_, key)| *key == new_order) {
        if let Err(err) = session.insert(ordering_session_key::<S>(), new_order) {
            log::error!("Failed to store ordering: {}", err);
        }
    } else {
        flash_error(session, "New sorting method is incorrect.");
    }
}

/// The ordering in effect: the session's pick if it is still a declared
/// key, otherwise the first declared tuple.
pub fn current_ordering<S: ListScreen>(session: &Session) -> (&'static str, &'static str) {
    let stored = session
        .get::<String>(&ordering_session_key::<S>())
        .ok()
        .flatten();

    S::ORDERING
        .iter()
        .find(|(_, key)| Some(*key) == stored.as_deref())
        .copied()
        .unwrap_or(S::ORDERING[0])
}

/// Fetch a list screen's page of rows with its paginator.
pub async fn list_page<S: ListScreen>(
    session: &Session,
    page: i32,
) -> Result<(Vec<<S::Entity as EntityTrait>::Model>, Paginator), DbErr>
where
    <S::Entity as EntityTrait>::Model: Sync,
{
    let db = get_db_pool();
    let ordering = current_ordering::<S>(session);
    let query = S::order_query(S::Entity::find(), ordering.1);

    if S::ITEMS_PER_PAGE <= 0 {
        let items = query.all(db).await?;
        let paginator = Paginator {
            base_url: S::ROOT_LINK.to_owned(),
            this_page: 1,
            page_count: 1,
        };
        return Ok((items, paginator));
    }

    let pager = query.paginate(db, S::ITEMS_PER_PAGE as usize);
    let page_count = std::cmp::max(1, pager.num_pages().await? as i32);
    let page = page.clamp(1, page_count);
    let items = pager.fetch_page((page - 1) as usize).await?;

    Ok((
        items,
        Paginator {
            base_url: S::ROOT_LINK.to_owned(),
            this_page: page,
            page_count,
        },
    ))
}

/// Orderings other than the active one, for the list header dropdown.
pub fn ordering_choices<S: ListScreen>(
    active: (&'static str, &'static str),
) -> Vec<(&'static str, &'static str)> {
    S::ORDERING
        .iter()
        .filter(|(_, key)| *key != active.1)
        .copied()
        .collect()
}
