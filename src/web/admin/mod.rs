//! Administration panel.
//!
//! Screens are composed from the scaffolding in [`scaffold`]; anything that
//! goes wrong inside the panel flashes a message and redirects instead of
//! surfacing an error page.

pub mod categories;
pub mod events;
pub mod scaffold;

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{categories as category_entities, posts, thread_events, threads, users};
use crate::web::flash::{take_flashes, Flash};
use actix_web::{error, get, Error, Responder};
use askama_actix::{Template, TemplateToResponse};
use sea_orm::{entity::*, query::*};

pub(in crate::web) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard);
    categories::configure(conf);
    events::configure(conf);
}

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    client: ClientCtx,
    flashes: Vec<Flash>,
    category_count: usize,
    thread_count: usize,
    post_count: usize,
    user_count: usize,
    recent_events: Vec<thread_events::Model>,
}

#[get("/admin")]
pub async fn view_dashboard(
    client: ClientCtx,
    session: actix_session::Session,
) -> Result<impl Responder, Error> {
    client.require_login()?;
    client.require_permission("admin.access")?;

    let db = get_db_pool();

    let (category_count, thread_count, post_count, user_count, recent_events) = futures::join!(
        category_entities::Entity::find().count(db),
        threads::Entity::find().count(db),
        posts::Entity::find().count(db),
        users::Entity::find().count(db),
        thread_events::Entity::find()
            .order_by_desc(thread_events::Column::CreatedAt)
            .limit(10)
            .all(db),
    );

    Ok(DashboardTemplate {
        client,
        flashes: take_flashes(&session),
        category_count: category_count.map_err(error::ErrorInternalServerError)?,
        thread_count: thread_count.map_err(error::ErrorInternalServerError)?,
        post_count: post_count.map_err(error::ErrorInternalServerError)?,
        user_count: user_count.map_err(error::ErrorInternalServerError)?,
        recent_events: recent_events.map_err(error::ErrorInternalServerError)?,
    }
    .to_response())
}
